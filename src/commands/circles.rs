use anyhow::Result;
use owo_colors::OwoColorize;

use crate::commands::open_store;

pub fn run(token: &str) -> Result<()> {
    let store = open_store()?;
    let user = store.session_user(token)?;

    let circles = store.joined_circles(&user.id)?;
    if circles.is_empty() {
        println!("No circles yet.");
        return Ok(());
    }

    println!("Circles for {}:\n", user.full_name.bold());
    for circle in circles {
        let marker = if circle.owner_id == user.id {
            "(owner)".yellow().to_string()
        } else {
            String::new()
        };
        println!("  {} {} {}", circle.name.green(), circle.id.dimmed(), marker);
    }

    Ok(())
}
