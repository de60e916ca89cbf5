//! Actions attached to menu items and their execution.

use crate::app::library::CollectionLibrary;
use crate::app::quick_select::QuickSelectSet;
use crate::domain::errors::{QuickMenusError, Result};
use crate::domain::model::RadialPosition;
use crate::host::MenuHost;

/// What a menu item does when the artist picks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// Select the nodes of a set in the active collection.
    SelectSet { index: usize, additive: bool },
    /// Store the current host selection as a new set.
    SaveSelectionAsSet { position: Option<RadialPosition> },
    AddSelectionToSet { index: usize },
    ReplaceSetWithSelection { index: usize },
    /// Prompt for a new set title.
    RenameSet { index: usize },
    RemoveSet { index: usize },
    /// Remove every set after confirmation.
    ClearCollection,
    SwitchCollection { name: String },
    NewCollection,
    RenameCollection,
    DeleteCollection,
}

/// Result of running an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,
    /// A dialog was dismissed, nothing changed.
    Cancelled,
}

/// Run `action` against the library and host.
pub fn perform<H>(
    action: &MenuAction,
    library: &mut CollectionLibrary,
    host: &mut H,
) -> Result<ActionOutcome>
where
    H: MenuHost + ?Sized,
{
    tracing::debug!(?action, "performing menu action");
    match action {
        MenuAction::SelectSet { index, additive } => {
            let collection = library.active()?;
            let set = collection
                .get(*index)
                .ok_or(QuickMenusError::IndexOutOfRange {
                    index: *index,
                    len: collection.len(),
                })?;
            set.select(host, *additive)?;
        }
        MenuAction::SaveSelectionAsSet { position } => {
            let selection = selection_or_error(host)?;
            let set = QuickSelectSet::new(selection, None, *position)?;
            library.with_active(|collection, store| collection.add_set(set, store))?;
        }
        MenuAction::AddSelectionToSet { index } => {
            let selection = selection_or_error(host)?;
            library.with_active(|collection, store| {
                collection.modify_set(*index, store, |set| set.add_nodes(&selection))
            })?;
        }
        MenuAction::ReplaceSetWithSelection { index } => {
            let selection = selection_or_error(host)?;
            library.with_active(|collection, store| {
                collection.modify_set(*index, store, |set| set.replace_nodes(&selection))
            })?;
        }
        MenuAction::RenameSet { index } => {
            let current = library
                .active()?
                .get(*index)
                .map(QuickSelectSet::effective_title)
                .unwrap_or_default();
            let Some(title) = host.prompt_dialog("Rename Set", "Enter a new title:", &current)
            else {
                return Ok(ActionOutcome::Cancelled);
            };
            library.with_active(|collection, store| {
                collection.modify_set(*index, store, |set| {
                    set.rename(Some(title));
                    Ok(())
                })
            })?;
        }
        MenuAction::RemoveSet { index } => {
            library.with_active(|collection, store| collection.remove_at_index(*index, store))?;
        }
        MenuAction::ClearCollection => {
            let name = library.active_name()?;
            let message = format!("Remove all sets from '{name}'?");
            if !confirmed(host, "Clear Collection", &message, "Clear") {
                return Ok(ActionOutcome::Cancelled);
            }
            library.with_active(|collection, store| collection.clear(store))?;
        }
        MenuAction::SwitchCollection { name } => {
            library.set_active(name)?;
        }
        MenuAction::NewCollection => {
            let Some(name) = host.prompt_dialog("New Collection", "Enter a collection name:", "")
            else {
                return Ok(ActionOutcome::Cancelled);
            };
            library.set_active(&name)?;
        }
        MenuAction::RenameCollection => {
            let current = library.active_name()?;
            let Some(name) =
                host.prompt_dialog("Rename Collection", "Enter a new name:", &current)
            else {
                return Ok(ActionOutcome::Cancelled);
            };
            library.rename(&current, &name)?;
        }
        MenuAction::DeleteCollection => {
            let name = library.active_name()?;
            let message = format!("Delete collection '{name}' and all of its sets?");
            if !confirmed(host, "Delete Collection", &message, "Delete") {
                return Ok(ActionOutcome::Cancelled);
            }
            library.delete(&name)?;
        }
    }
    Ok(ActionOutcome::Applied)
}

fn selection_or_error<H>(host: &H) -> Result<Vec<String>>
where
    H: MenuHost + ?Sized,
{
    let selection = host.current_selection();
    if selection.is_empty() {
        return Err(QuickMenusError::invalid_argument("nothing is selected"));
    }
    Ok(selection)
}

fn confirmed<H>(host: &mut H, title: &str, message: &str, accept: &str) -> bool
where
    H: MenuHost + ?Sized,
{
    host.confirm_dialog(title, message, &[accept, "Cancel"])
        .is_some_and(|choice| choice == accept)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::host::headless::HeadlessHost;
    use crate::host::store::MemoryStore;

    use RadialPosition::{N, S};

    fn setup() -> (CollectionLibrary, HeadlessHost) {
        (
            CollectionLibrary::new(Box::new(MemoryStore::new()), "default"),
            HeadlessHost::new(),
        )
    }

    fn titles(library: &mut CollectionLibrary) -> Vec<String> {
        library
            .active()
            .unwrap()
            .sets()
            .iter()
            .map(QuickSelectSet::effective_title)
            .collect()
    }

    #[test]
    fn save_selection_then_select_it_back() {
        let (mut library, mut host) = setup();
        host.select(["|pCube1", "|pSphere1"]);
        perform(
            &MenuAction::SaveSelectionAsSet { position: Some(N) },
            &mut library,
            &mut host,
        )
        .unwrap();
        assert_eq!(titles(&mut library), vec!["pCube1, pSphere1"]);

        host.select(Vec::<String>::new());
        perform(
            &MenuAction::SelectSet {
                index: 0,
                additive: false,
            },
            &mut library,
            &mut host,
        )
        .unwrap();
        assert_eq!(host.current_selection(), vec!["|pCube1", "|pSphere1"]);
    }

    #[test]
    fn saving_empty_selection_is_rejected() {
        let (mut library, mut host) = setup();
        let err = perform(
            &MenuAction::SaveSelectionAsSet { position: None },
            &mut library,
            &mut host,
        )
        .unwrap_err();
        assert!(matches!(err, QuickMenusError::InvalidArgument(_)));
    }

    #[test]
    fn saving_onto_taken_slot_conflicts() {
        let (mut library, mut host) = setup();
        host.select(["|a"]);
        let action = MenuAction::SaveSelectionAsSet { position: Some(S) };
        perform(&action, &mut library, &mut host).unwrap();
        let err = perform(&action, &mut library, &mut host).unwrap_err();
        assert!(matches!(err, QuickMenusError::PositionConflict(S)));
        assert_eq!(library.active().unwrap().len(), 1);
    }

    #[test]
    fn edits_apply_to_indexed_set() {
        let (mut library, mut host) = setup();
        host.select(["|a"]);
        perform(&MenuAction::SaveSelectionAsSet { position: None }, &mut library, &mut host)
            .unwrap();

        host.select(["|b"]);
        perform(&MenuAction::AddSelectionToSet { index: 0 }, &mut library, &mut host).unwrap();
        assert_eq!(titles(&mut library), vec!["a, b"]);

        host.select(["|c"]);
        perform(&MenuAction::ReplaceSetWithSelection { index: 0 }, &mut library, &mut host)
            .unwrap();
        assert_eq!(titles(&mut library), vec!["c"]);

        host.queue_prompt(Some("Hero"));
        perform(&MenuAction::RenameSet { index: 0 }, &mut library, &mut host).unwrap();
        assert_eq!(titles(&mut library), vec!["Hero"]);

        perform(&MenuAction::RemoveSet { index: 0 }, &mut library, &mut host).unwrap();
        assert!(library.active().unwrap().is_empty());
    }

    #[test]
    fn cancelled_dialogs_change_nothing() {
        let (mut library, mut host) = setup();
        host.select(["|a"]);
        perform(&MenuAction::SaveSelectionAsSet { position: None }, &mut library, &mut host)
            .unwrap();

        host.queue_prompt(None);
        assert_eq!(
            perform(&MenuAction::RenameSet { index: 0 }, &mut library, &mut host).unwrap(),
            ActionOutcome::Cancelled
        );
        host.queue_confirm(Some("Cancel"));
        assert_eq!(
            perform(&MenuAction::ClearCollection, &mut library, &mut host).unwrap(),
            ActionOutcome::Cancelled
        );
        assert_eq!(titles(&mut library), vec!["a"]);

        host.queue_confirm(Some("Clear"));
        perform(&MenuAction::ClearCollection, &mut library, &mut host).unwrap();
        assert!(library.active().unwrap().is_empty());
    }

    #[test]
    fn collection_actions_manage_library() {
        let (mut library, mut host) = setup();

        host.queue_prompt(Some("anim"));
        perform(&MenuAction::NewCollection, &mut library, &mut host).unwrap();
        assert_eq!(library.active_name().unwrap(), "anim");

        host.queue_prompt(Some("animation"));
        perform(&MenuAction::RenameCollection, &mut library, &mut host).unwrap();
        assert_eq!(library.active_name().unwrap(), "animation");

        perform(
            &MenuAction::SwitchCollection {
                name: "props".into(),
            },
            &mut library,
            &mut host,
        )
        .unwrap();
        assert_eq!(library.active_name().unwrap(), "props");

        host.queue_confirm(Some("Delete"));
        perform(&MenuAction::DeleteCollection, &mut library, &mut host).unwrap();
        assert_eq!(library.names().unwrap(), vec!["animation".to_string()]);
    }

    #[test]
    fn selecting_missing_set_is_out_of_range() {
        let (mut library, mut host) = setup();
        let err = perform(
            &MenuAction::SelectSet {
                index: 3,
                additive: true,
            },
            &mut library,
            &mut host,
        )
        .unwrap_err();
        assert!(matches!(err, QuickMenusError::IndexOutOfRange { index: 3, len: 0 }));
    }
}
