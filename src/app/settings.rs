use crate::corner_marks::CornerMarkConfig;
use crate::error::{FormError, FormResult};
use crate::model::PageSetup;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub file_path: String,
    pub svg_path: String,
    pub page: PageSetup,
    pub corner_marks: CornerMarkConfig,
    pub snap_to_grid: bool,
    pub grid_size: f32,
    pub move_step: f32,
    pub move_step_fast: f32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            file_path: "form.json".to_string(),
            svg_path: "form.svg".to_string(),
            page: PageSetup::default(),
            corner_marks: CornerMarkConfig::default(),
            snap_to_grid: false,
            grid_size: 8.0,
            move_step: 1.0,
            move_step_fast: 10.0,
        }
    }
}

fn parse_settings(path: &str, s: &str) -> FormResult<AppSettings> {
    if path.ends_with(".toml") {
        toml::from_str::<AppSettings>(s)
            .or_else(|e| serde_json::from_str::<AppSettings>(s).map_err(|_| e))
            .map_err(|e| FormError::settings_parse(e.to_string()))
    } else {
        serde_json::from_str::<AppSettings>(s)
            .or_else(|e| toml::from_str::<AppSettings>(s).map_err(|_| e))
            .map_err(|e| FormError::settings_parse(e.to_string()))
    }
}

pub fn load_settings(path: &str) -> FormResult<AppSettings> {
    let s = std::fs::read_to_string(path)?;
    parse_settings(path, &s)
}

/// Settings from `path`, or defaults when the file is missing or broken.
pub fn load_or_default(path: &str) -> AppSettings {
    match load_settings(path) {
        Ok(settings) => {
            tracing::info!(path, "loaded settings");
            settings
        }
        Err(FormError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            AppSettings::default()
        }
        Err(e) => {
            tracing::warn!(path, error = %e, "settings unreadable, using defaults");
            AppSettings::default()
        }
    }
}

pub fn save_settings(path: &str, settings: &AppSettings) -> FormResult<()> {
    let text = if path.ends_with(".toml") {
        toml::to_string_pretty(settings).map_err(|e| FormError::settings_write(e.to_string()))?
    } else {
        serde_json::to_string_pretty(settings)?
    };
    std::fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_toml_fills_defaults() {
        let s = r#"
            grid_size = 4.0

            [corner_marks]
            safe_zone_margin = 20.0
        "#;
        let settings = parse_settings("settings.toml", s).unwrap();
        assert_eq!(settings.grid_size, 4.0);
        assert_eq!(settings.corner_marks.safe_zone_margin, 20.0);
        assert_eq!(settings.corner_marks.safe_zone_padding, 10.0);
        assert!(settings.corner_marks.is_visible);
        assert_eq!(settings.page, PageSetup::default());
    }

    #[test]
    fn json_falls_back_to_toml() {
        let settings = parse_settings("settings.json", "move_step = 2.5").unwrap();
        assert_eq!(settings.move_step, 2.5);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(
            parse_settings("settings.toml", "{{{"),
            Err(FormError::SettingsParse(_))
        ));
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = std::env::temp_dir().join(format!("optiform-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml").display().to_string();
        let mut settings = AppSettings::default();
        settings.corner_marks.is_visible = false;
        settings.svg_path = "out.svg".to_string();
        save_settings(&path, &settings).unwrap();
        assert_eq!(load_settings(&path).unwrap(), settings);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_uses_defaults() {
        assert_eq!(
            load_or_default("/nonexistent/optiform/settings.toml"),
            AppSettings::default()
        );
    }
}
