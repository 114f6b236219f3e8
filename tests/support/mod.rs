#![allow(dead_code)]

pub mod fakes;

pub use fakes::{FakeCommandRunner, LocalDownloader, RecordingRegistrar};

pub fn get_spin_actions_binary() -> std::path::PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.join("spin-actions")
}
