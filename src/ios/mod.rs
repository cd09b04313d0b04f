//! Native iOS project configuration
//!
//! - `plist` - property list documents and the entitlements template
//! - `pbxproj` - span-preserving reader/editor for `project.pbxproj`
//! - `paths` - locating the Xcode project and entitlements files
//! - `entitlements` - manifest-driven entitlement setters

pub mod entitlements;
pub mod paths;
pub mod pbxproj;
pub mod plist;
