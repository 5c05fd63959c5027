//! Host executors that run [`Work`](crate::Work) outside the manager.

mod shell;

pub use shell::{ShellConfig, ShellExecutor, render_arguments};
