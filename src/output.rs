use colored::*;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};

pub static DEBUG: AtomicBool = AtomicBool::new(false);

pub fn set_debug(enable: bool) {
    DEBUG.store(enable, Ordering::Relaxed);
}

pub fn is_debug() -> bool {
    DEBUG.load(Ordering::Relaxed)
}

pub fn info(msg: impl Display) {
    println!("{}", msg);
}

pub fn step(msg: impl Display) {
    println!("  {}", msg);
}

pub fn success(msg: impl Display) {
    println!("{} {}", "✔".green(), msg);
}

pub fn warn(msg: impl Display) {
    println!("{} {}", "⚠".yellow(), msg);
}

pub fn failure(msg: impl Display) {
    println!("{} {}", "✘".red(), msg);
}

pub fn debug(msg: impl Display) {
    if is_debug() {
        println!("  {} {}", "[debug]".dimmed(), msg);
    }
}
