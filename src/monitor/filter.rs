use std::path::Path;

use notify::event::{CreateKind, RemoveKind};
use notify::{Event, EventKind};

/// File suffixes the watcher reacts to.
pub const CONFIG_SUFFIXES: [&str; 3] = [".yaml", ".yml", ".env"];

/// True for the event kinds that can change configuration content
/// (access/open/close noise excluded).
pub fn is_content_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// True when the event targets a directory rather than a file.
pub fn is_directory_event(event: &Event) -> bool {
    if matches!(
        event.kind,
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder)
    ) {
        return true;
    }
    event.paths.iter().any(|path| path.is_dir())
}

/// True when the path ends in one of the watched config suffixes.
/// `.env` itself qualifies; `Path::extension` would miss it.
pub fn is_config_path(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    CONFIG_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_config_paths_match_suffixes() {
        assert!(is_config_path(Path::new("/etc/app/config.yaml")));
        assert!(is_config_path(Path::new("/etc/app/10-override.yml")));
        assert!(is_config_path(Path::new("/srv/app/.env")));
        assert!(is_config_path(Path::new("/srv/app/production.env")));
    }

    #[test]
    fn test_non_config_paths_rejected() {
        assert!(!is_config_path(Path::new("/etc/app/config.toml")));
        assert!(!is_config_path(Path::new("/etc/app/config.yaml.bak")));
        assert!(!is_config_path(Path::new("/etc/app/README.md")));
        assert!(!is_config_path(Path::new("/")));
    }

    #[test]
    fn test_access_events_are_not_content_events() {
        assert!(!is_content_event(&EventKind::Access(
            notify::event::AccessKind::Any
        )));
        assert!(is_content_event(&EventKind::Modify(
            notify::event::ModifyKind::Any
        )));
        assert!(is_content_event(&EventKind::Remove(RemoveKind::Any)));
    }

    #[test]
    fn test_folder_creation_is_directory_event() {
        let event = Event::new(EventKind::Create(CreateKind::Folder))
            .add_path(PathBuf::from("/tmp/new-dir"));
        assert!(is_directory_event(&event));
    }

    #[test]
    fn test_file_modification_is_not_directory_event() {
        let event = Event::new(EventKind::Modify(notify::event::ModifyKind::Any))
            .add_path(PathBuf::from("/tmp/definitely-not-a-real-dir/config.yaml"));
        assert!(!is_directory_event(&event));
    }
}
