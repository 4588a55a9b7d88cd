//! Account and session commands.

use console::style;

use crate::session::{Session, SignupForm};

fn optional(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => "N/A",
    }
}

pub async fn cmd_login(session: &mut Session, username: &str, password: &str) -> anyhow::Result<()> {
    session.login(username, password).await?;

    println!("{} logged in as {}", style("✓").green(), style(username).bold());
    if let Some(profile) = session.profile() {
        println!("  {} {}", profile.first_name, profile.last_name);
    }
    let records = session.history().records().len();
    if records > 0 {
        println!("  {} past quer{}", records, if records == 1 { "y" } else { "ies" });
    }
    Ok(())
}

pub async fn cmd_signup(session: &Session, form: &SignupForm) -> anyhow::Result<()> {
    session.signup(form).await?;
    println!(
        "{} account created. Log in with: policyintel login {}",
        style("✓").green(),
        form.username
    );
    Ok(())
}

pub fn cmd_logout(session: &mut Session) -> anyhow::Result<()> {
    session.logout()?;
    println!("{} logged out", style("✓").green());
    Ok(())
}

pub async fn cmd_profile(session: &mut Session) -> anyhow::Result<()> {
    let profile = session.fetch_profile().await?;

    println!("\n{}", style("Profile").bold());
    println!("{}", "-".repeat(40));
    println!("  {:<14} {}", "Username", profile.username);
    println!(
        "  {:<14} {} {}",
        "Name", profile.first_name, profile.last_name
    );
    println!("  {:<14} {}", "Email", profile.email);
    println!(
        "  {:<14} {}",
        "Organization",
        optional(profile.organization.as_deref())
    );
    println!("  {:<14} {}", "Role", optional(profile.role.as_deref()));
    Ok(())
}
