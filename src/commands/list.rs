use colored::Colorize;

use crate::config::Config;
use crate::store;

pub async fn list(config: &Config, details: bool) -> crate::Result<()> {
    let db = crate::util::open_existing_database(&config.database_path()).await?;
    let mods_dir = config.mods_dir();

    let mods = store::all_records(&db).await?;
    if mods.is_empty() {
        println!("No mods tracked yet.");
        return Ok(());
    }

    for installed in mods.iter() {
        let present = mods_dir.join(&installed.filename).is_file();
        let name = if present {
            installed.title.green()
        } else {
            installed.title.red()
        }
        .bold();

        if !details {
            println!("- {} ({})", name, installed.filename);
            continue;
        }

        let history = store::history_for(&db, &installed.slug).await?;

        let title_corner = boxy::Char::upper_left(boxy::Weight::Thick);
        let title_side_h = boxy::Char::horizontal(boxy::Weight::Thick).to_string();
        let title_side_v = boxy::Char::vertical(boxy::Weight::Thick);
        let title_branch = boxy::Char::right_tee(boxy::Weight::Thick).down(boxy::Weight::Normal);
        let left_branch_more = boxy::Char::right_tee(boxy::Weight::Normal);
        let left_branch_more_str = boxy::Char::right_tee(boxy::Weight::Normal).to_string();
        let left_branch_done = boxy::Char::lower_left(boxy::Weight::Normal);
        let left_branch_done_str = boxy::Char::lower_left(boxy::Weight::Normal).to_string();
        let left_node = boxy::Char::left_half(boxy::Weight::Normal);
        let down_branch = boxy::Char::down_tee(boxy::Weight::Normal);

        println!(
            "{}{}{}",
            title_corner,
            title_side_h.repeat(installed.title.len() + 2),
            title_corner.rotate_cw(1)
        );
        println!("{} {} {}", title_side_v, name, title_side_v);
        println!(
            "{}{}{}",
            title_branch,
            title_side_h.repeat(installed.title.len() + 2),
            title_corner.rotate_cw(2)
        );
        println!(
            "{}{}{} {}",
            left_branch_more,
            left_node,
            "Slug:".bold(),
            installed.slug
        );
        println!(
            "{}{}{} {}",
            left_branch_more,
            left_node,
            "Record ID:".bold(),
            installed.id
        );
        println!(
            "{}{}{} {}",
            left_branch_more,
            left_node,
            "Version:".bold(),
            installed.version_id.as_deref().unwrap_or("unknown")
        );
        println!(
            "{}{}{} {}",
            left_branch_more,
            left_node,
            "Updated:".bold(),
            installed.updated
        );
        println!(
            "{}{}{} {}{}",
            if history.is_empty() {
                left_branch_done
            } else {
                left_branch_more
            },
            left_node,
            "File:".bold(),
            installed.filename,
            if present { String::new() } else { " (missing)".red().to_string() }
        );

        if !history.is_empty() {
            println!(
                "{}{}{}{}",
                left_branch_done,
                down_branch,
                left_node,
                "Previous:".bold()
            );
            let mut entries = history.iter().peekable();
            while let Some(entry) = entries.next() {
                println!(
                    " {}{}{} ({})",
                    if entries.peek().is_some() {
                        &left_branch_more_str
                    } else {
                        &left_branch_done_str
                    },
                    left_node,
                    entry.filename,
                    if entry.archive_path.is_some() {
                        "archived".blue()
                    } else {
                        "deleted".dimmed()
                    }
                );
            }
        }
    }

    Ok(())
}
