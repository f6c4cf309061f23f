//! Interactive mode: pick a folder from a menu, see what would happen, then
//! act on it.
//!
//! Every action runs through [`run_cli_with_config`], so the menu behaves
//! exactly like the equivalent command-line flags.

use crate::cli::{OrganizeCommand, run_cli_with_config};
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputFormatter;
use crate::session::OrganizeSession;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use std::path::{Path, PathBuf};

/// One entry of the folder menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderChoice {
    pub label: String,
    /// `None` asks for a path.
    pub path: Option<PathBuf>,
}

/// Folders offered by the menu: `start`, the usual folders under `home`,
/// and a custom path.
pub fn folder_choices(start: &Path, home: Option<&Path>) -> Vec<FolderChoice> {
    let mut choices = vec![FolderChoice {
        label: format!("Current directory ({})", start.display()),
        path: Some(start.to_path_buf()),
    }];

    if let Some(home) = home {
        for (label, name) in [
            ("Downloads folder", "Downloads"),
            ("Desktop", "Desktop"),
            ("Documents folder", "Documents"),
        ] {
            choices.push(FolderChoice {
                label: label.to_string(),
                path: Some(home.join(name)),
            });
        }
    }

    choices.push(FolderChoice {
        label: "Custom path".to_string(),
        path: None,
    });
    choices
}

/// Actions offered once a folder is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    DryRun,
    Organize,
    Preview,
    Undo,
    Exit,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::DryRun,
        Action::Organize,
        Action::Preview,
        Action::Undo,
        Action::Exit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Action::DryRun => "Dry run (preview only, safe)",
            Action::Organize => "Organize files (actually move files)",
            Action::Preview => "Show detailed preview",
            Action::Undo => "Undo the last organization",
            Action::Exit => "Exit",
        }
    }

    /// The command this action runs; `None` ends the session.
    pub fn command(self) -> Option<OrganizeCommand> {
        match self {
            Action::DryRun => Some(OrganizeCommand::Organize { dry_run: true }),
            Action::Organize => Some(OrganizeCommand::Organize { dry_run: false }),
            Action::Preview => Some(OrganizeCommand::Preview),
            Action::Undo => Some(OrganizeCommand::Undo { log: None }),
            Action::Exit => None,
        }
    }
}

/// Runs the menu-driven session until the user exits.
///
/// Failed actions are reported and the menu comes back; only prompt and
/// configuration errors end the session.
pub fn run_interactive(start: &Path, config_path: Option<&Path>) -> Result<()> {
    let theme = ColorfulTheme::default();
    OutputFormatter::header("FOLDERTIDY");

    let home = std::env::var_os("HOME").map(PathBuf::from);
    let folder = choose_folder(&theme, start, home.as_deref())?;
    OutputFormatter::info(&format!("Selected folder: {}", folder.display()));

    let session = OrganizeSession::from_config(&Config::load(config_path)?)?;
    let (_, stats) = session.organize(&folder, true)?;
    OutputFormatter::statistics_table(&stats, true);

    let labels: Vec<&str> = Action::ALL.iter().map(|a| a.label()).collect();
    loop {
        let index = Select::with_theme(&theme)
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;
        let action = Action::ALL[index];

        if action == Action::Organize
            && !Confirm::with_theme(&theme)
                .with_prompt("This will move files. Continue?")
                .default(false)
                .interact()?
        {
            OutputFormatter::info("Operation cancelled.");
            continue;
        }

        let Some(command) = action.command() else {
            return Ok(());
        };
        if let Err(e) = run_cli_with_config(command, &folder, config_path) {
            OutputFormatter::error(&e.to_string());
        }
    }
}

/// Asks until the user picks an existing directory.
fn choose_folder(theme: &ColorfulTheme, start: &Path, home: Option<&Path>) -> Result<PathBuf> {
    let choices = folder_choices(start, home);
    let labels: Vec<&str> = choices.iter().map(|c| c.label.as_str()).collect();

    loop {
        let index = Select::with_theme(theme)
            .with_prompt("Select the folder to organize")
            .items(&labels)
            .default(0)
            .interact()?;

        let folder = match &choices[index].path {
            Some(path) => path.clone(),
            None => {
                let input: String = Input::with_theme(theme)
                    .with_prompt("Full path to the folder")
                    .interact_text()?;
                PathBuf::from(input.trim())
            }
        };

        if folder.is_dir() {
            return Ok(folder);
        }
        OutputFormatter::error(&format!("Not an existing directory: {}", folder.display()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_choices_with_home() {
        let choices = folder_choices(Path::new("."), Some(Path::new("/home/user")));

        assert_eq!(choices.len(), 5);
        assert_eq!(choices[0].path.as_deref(), Some(Path::new(".")));
        assert_eq!(
            choices[1].path.as_deref(),
            Some(Path::new("/home/user/Downloads"))
        );
        assert_eq!(choices.last().map(|c| c.path.clone()), Some(None));
    }

    #[test]
    fn test_folder_choices_without_home() {
        let choices = folder_choices(Path::new("/data"), None);

        assert_eq!(choices.len(), 2);
        assert!(choices[0].label.contains("/data"));
        assert_eq!(choices[1].label, "Custom path");
    }

    #[test]
    fn test_actions_map_to_commands() {
        assert_eq!(
            Action::DryRun.command(),
            Some(OrganizeCommand::Organize { dry_run: true })
        );
        assert_eq!(
            Action::Organize.command(),
            Some(OrganizeCommand::Organize { dry_run: false })
        );
        assert_eq!(Action::Preview.command(), Some(OrganizeCommand::Preview));
        assert_eq!(
            Action::Undo.command(),
            Some(OrganizeCommand::Undo { log: None })
        );
        assert_eq!(Action::Exit.command(), None);
    }

    #[test]
    fn test_action_labels_are_distinct() {
        let mut labels: Vec<_> = Action::ALL.iter().map(|a| a.label()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), Action::ALL.len());
    }
}
