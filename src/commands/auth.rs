use anyhow::Result;
use owo_colors::OwoColorize;

use crate::commands::open_store;

pub fn run(email: &str, name: Option<&str>) -> Result<()> {
    let store = open_store()?;

    let user = match store.user_by_email(email)? {
        Some(user) => {
            println!("Found existing user {}", user.full_name.bold());
            user
        }
        None => {
            let full_name = name.unwrap_or(email);
            let user = store.create_user(full_name, email)?;
            println!("Created user {}", user.full_name.bold());
            user
        }
    };

    let session = store.create_session(&user.id)?;

    println!("\nSession token (pass as a Bearer token or --token):");
    println!("  {}", session.token.green());

    Ok(())
}
