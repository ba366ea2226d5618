//! Step and banner output
//!
//! Interactive terminals get cliclack's log lines; everything else gets a
//! bracketed tag so CI logs stay greppable.

use super::context::UiContext;
use console::style;

#[derive(Clone, Copy)]
enum Level {
    Ok,
    Warn,
    Fail,
    Info,
}

fn step(ctx: &UiContext, level: Level, message: &str) {
    if ctx.is_interactive() {
        match level {
            Level::Ok => cliclack::log::success(message).ok(),
            Level::Warn => cliclack::log::warning(message).ok(),
            Level::Fail => cliclack::log::error(message).ok(),
            Level::Info => cliclack::log::info(message).ok(),
        };
        return;
    }
    let tag = match level {
        Level::Ok => style("[OK]").green(),
        Level::Warn => style("[WARN]").yellow(),
        Level::Fail => style("[FAIL]").red(),
        Level::Info => style("[INFO]").cyan(),
    };
    println!("  {} {}", tag, message);
}

/// Display intro banner
pub fn intro(ctx: &UiContext, title: &str) {
    if ctx.is_interactive() {
        cliclack::intro(style(title).cyan().bold()).ok();
    } else {
        println!("{}", style(title).cyan().bold());
    }
}

/// Display success outro
pub fn outro_success(ctx: &UiContext, message: &str) {
    if ctx.is_interactive() {
        cliclack::outro(style(message).green().bold()).ok();
    } else {
        println!("{} {}", style("[OK]").green(), message);
    }
}

/// Display warning outro
pub fn outro_warn(ctx: &UiContext, message: &str) {
    if ctx.is_interactive() {
        cliclack::outro(style(message).yellow().bold()).ok();
    } else {
        println!("{} {}", style("[WARN]").yellow(), message);
    }
}

pub fn step_ok_detail(ctx: &UiContext, message: &str, detail: &str) {
    step(ctx, Level::Ok, &format!("{} ({})", message, style(detail).dim()));
}

pub fn step_warn_hint(ctx: &UiContext, message: &str, hint: &str) {
    step(ctx, Level::Warn, &format!("{} - {}", message, style(hint).dim()));
}

pub fn step_error_detail(ctx: &UiContext, message: &str, detail: &str) {
    step(ctx, Level::Fail, &format!("{}: {}", message, style(detail).red()));
}

pub fn step_info(ctx: &UiContext, message: &str) {
    step(ctx, Level::Info, message);
}

/// Display a dimmed remark
pub fn remark(ctx: &UiContext, message: &str) {
    if ctx.is_interactive() {
        cliclack::log::remark(message).ok();
    } else {
        println!("  {}", style(message).dim());
    }
}

/// Print styled key-value pair
pub fn key_value(ctx: &UiContext, key: &str, value: &str) {
    if ctx.is_interactive() {
        println!("  {}: {}", style(key).dim(), value);
    } else {
        println!("  {}: {}", key, value);
    }
}
