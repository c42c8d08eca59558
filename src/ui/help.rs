//! Help overlay text

/// Lines of the help overlay for the given activator
pub fn lines(activator: char) -> Vec<String> {
    let prefix = format!("Ctrl+{}", activator.to_ascii_uppercase());
    vec![
        format!("{} enters prefix mode, then:", prefix),
        String::new(),
        format!("  {:<12} send {} to the pane", activator, prefix),
        format!("  {:<12} previous / next pane", "Bksp Space"),
        format!("  {:<12} move to neighboring pane", "Arrows"),
        format!("  {:<12} jump to pane", "1-9"),
        format!("  {:<12} toggle pane numbers", "n"),
        format!("  {:<12} redraw", "l"),
        format!("  {:<12} toggle zoom", "z"),
        format!("  {:<12} scroll mode", "v"),
        format!("  {:<12} restart pane", "r"),
        format!("  {:<12} pane menu", "m"),
        format!("  {:<12} quit", "k"),
        format!("  {:<12} this help", "?"),
        String::new(),
        "Any other key leaves prefix mode.".to_string(),
    ]
}
