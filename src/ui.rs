// UI layer: terminal prompts built on `dialoguer`, plus a spinner for the
// blocking network calls.

use crate::api::{Course, Credentials};
use anyhow::Result;
use crossterm::style::Stylize;
use dialoguer::{Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Ask for the MLWL username and (hidden) password.
pub fn prompt_credentials() -> Result<Credentials> {
    let username: String = Input::new()
        .with_prompt("Enter your MLWL username")
        .interact_text()?;
    // `Password` turns terminal echo off while typing.
    let password: String = Password::new()
        .with_prompt("Enter your MLWL password")
        .interact()?;
    Ok(Credentials { username, password })
}

pub fn format_course_list(courses: &[Course]) -> String {
    courses
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}\n", i + 1, c.name))
        .collect()
}

/// Print the numbered course list and let the user pick one.
pub fn select_course(courses: &[Course]) -> Result<&Course> {
    if courses.is_empty() {
        anyhow::bail!("No courses found for this account");
    }
    println!("\nCourses:\n{}", format_course_list(courses));
    let names: Vec<&str> = courses.iter().map(|c| c.name.as_str()).collect();
    let selection = Select::new()
        .with_prompt("Select a course")
        .items(&names)
        .default(0)
        .interact()?;
    let course = &courses[selection];
    println!("You selected: {} (ID: {})", course.name, course.id);
    Ok(course)
}

/// Run `f` while a spinner with `msg` is shown.
pub fn with_spinner<T>(msg: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(msg.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    let out = f();
    spinner.finish_and_clear();
    out
}

pub fn warn_line(msg: &str) {
    eprintln!("{}", format!("Warning: {}", msg).yellow());
}

pub fn ok_line(msg: &str) {
    println!("{}", msg.green());
}
