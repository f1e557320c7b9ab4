mod dirs;
mod settings;
mod store;

pub use dirs::Directories;
pub use settings::{
    AppPrefs, CapturePrefs, GesturePrefs, Preferences, SlotPrefs, StoragePrefs,
};
pub use store::PrefsStore;
