pub mod overlap_watcher;
