//! Welcome banner shown when entering a room.

use console::style;

/// Print the room banner: name, id, who you are, invite link and plan count.
pub fn print_welcome_banner(
    room_name: &str,
    room_id: i64,
    user_name: &str,
    invite_url: &str,
    plan_count: usize,
) {
    println!();
    println!("  {} {}", style("✈").bold(), style(room_name).cyan().bold());
    println!();
    println!("  {}    {}", style("Room:").bold(), style(room_id).dim());
    println!("  {}     {}", style("You:").bold(), user_name);
    println!("  {}  {}", style("Invite:").bold(), style(invite_url).underlined());
    if plan_count > 0 {
        println!(
            "  {}   {} (type /plans)",
            style("Plans:").bold(),
            plan_count
        );
    }
    println!();
    println!(
        "  {}",
        style("Type /help for commands, Ctrl+D to exit").dim()
    );
    println!("  {}", style("---").dim());
    println!();
}
