pub mod console;
pub mod formatter;

/// Force colored output off (e.g. `--no-color`)
pub fn disable_color() {
    colored::control::set_override(false);
}
