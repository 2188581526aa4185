// File: window.rs
// Location: /src/window.rs

use anyhow::{anyhow, Result};
use gdk_pixbuf::{Pixbuf, PixbufLoader};
use gtk4::prelude::*;
use libadwaita::{self as adw, prelude::*};
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

use adwaita_qrcode::config::{self, AppPreferences};
use adwaita_qrcode::form::FormState;
use adwaita_qrcode::generate;
use adwaita_qrcode::settings::{self, SOFTWARE_NAME, SOFTWARE_VERSION};

use crate::ui::{content_page::ContentTabs, icon_name, options_panel::OptionsPanel};

const DEFAULT_EXPORT_NAME: &str = "qrcode";
const DEFAULT_SETTINGS_NAME: &str = "adw-qrcode-settings.json";

const APP_CSS: &str = r#"
/* Inline generation errors */
.inline-error {
    color: @error_color;
    padding: 6px 12px;
    font-size: 0.9em;
}

/* Preview */
.preview-frame {
    background: #AAAAAA;
    border-radius: 12px;
    padding: 12px;
}

.section-header {
    font-size: 0.8em;
    letter-spacing: 0.06em;
    opacity: 0.7;
}

button.pill {
    padding: 8px 18px;
}

viewswitcher button {
    padding: 6px 12px;
}

viewswitcher button:checked {
    background: alpha(@accent_bg_color, 0.25);
}
"#;

/// Everything the user can do. Each event is handled to completion before
/// the main loop delivers the next one.
#[derive(Debug)]
pub enum ShellEvent {
    FieldChanged,
    TabChanged,
    Generate,
    ExportImage(PathBuf),
    ExportSettings(PathBuf),
    ImportSettings(PathBuf),
    Exit,
}

fn pixbuf_from_png(bytes: &[u8]) -> Result<Pixbuf> {
    let loader = PixbufLoader::with_type("png")?;
    loader.write(bytes)?;
    loader.close()?;
    loader
        .pixbuf()
        .ok_or_else(|| anyhow!("Preview image could not be decoded"))
}

#[derive(Clone)]
struct Shell {
    window: adw::ApplicationWindow,
    tabs: ContentTabs,
    options: OptionsPanel,
    preview: gtk4::Picture,
    error_label: gtk4::Label,
    state: Rc<RefCell<FormState>>,
    prefs: Rc<RefCell<AppPreferences>>,
    applying: Rc<Cell<bool>>,
}

impl Shell {
    fn dispatch(&self, event: ShellEvent) {
        if self.prefs.borrow().debug_events {
            log::debug!("Event: {:?}", event);
        }

        match event {
            ShellEvent::FieldChanged | ShellEvent::TabChanged => {
                // widgets are being filled from an imported file
                if self.applying.get() {
                    return;
                }
                self.sync_from_widgets();
                if self.prefs.borrow().live_preview {
                    self.autogenerate();
                }
            }
            ShellEvent::Generate => {
                self.sync_from_widgets();
                let result = generate::try_generate(&self.state.borrow());
                match result {
                    Ok(bytes) => self.show_preview(&bytes),
                    Err(e) => {
                        log::warn!("Generation failed: {}", e);
                        self.show_error("Generation Failed", &e.to_string());
                    }
                }
            }
            ShellEvent::ExportImage(path) => {
                self.sync_from_widgets();
                let result = generate::export(&self.state.borrow(), &path);
                match result {
                    Ok(written) => {
                        self.show_message("File Exported", &written.display().to_string());
                    }
                    Err(e) => {
                        log::error!("Export to {} failed: {}", path.display(), e);
                        self.show_error("Export Failed", &e.to_string());
                    }
                }
            }
            ShellEvent::ExportSettings(path) => {
                self.sync_from_widgets();
                let result = settings::export_settings(&path, &self.state.borrow());
                match result {
                    Ok(written) => self.show_message(
                        "Settings Exported",
                        &format!("Configuration written to {}", written.display()),
                    ),
                    Err(e) => {
                        log::error!("Could not export config: {}", e);
                        self.show_error("Could not export config", &e.to_string());
                    }
                }
            }
            ShellEvent::ImportSettings(path) => {
                let result = settings::import_settings(&path, &mut self.state.borrow_mut());
                match result {
                    Ok(()) => {
                        self.push_state_to_widgets();
                        self.autogenerate();
                    }
                    Err(e) => {
                        log::error!("Could not import config file {}: {}", path.display(), e);
                        self.show_error(
                            "Could not import config",
                            &format!("Could not import config file {}: {}", path.display(), e),
                        );
                    }
                }
            }
            ShellEvent::Exit => self.window.close(),
        }
    }

    fn sync_from_widgets(&self) {
        let mut state = self.state.borrow_mut();
        self.tabs.read_into(&mut state);
        self.options.read_into(&mut state);
    }

    fn push_state_to_widgets(&self) {
        let snapshot = self.state.borrow().clone();
        self.applying.set(true);
        self.options.write_from(&snapshot);
        self.tabs.write_from(&snapshot);
        self.applying.set(false);
    }

    /// Best effort: failures only land in the inline error line.
    fn autogenerate(&self) {
        let result = generate::try_generate(&self.state.borrow());
        match result {
            Ok(bytes) => self.show_preview(&bytes),
            Err(e) => {
                log::debug!("Autogen: {}", e);
                self.error_label.set_text(&e.to_string());
            }
        }
    }

    fn show_preview(&self, bytes: &[u8]) {
        match pixbuf_from_png(bytes) {
            Ok(pixbuf) => {
                self.preview.set_pixbuf(Some(&pixbuf));
                self.error_label.set_text("");
            }
            Err(e) => self.error_label.set_text(&e.to_string()),
        }
    }

    fn show_message(&self, heading: &str, body: &str) {
        let dialog = adw::AlertDialog::new(Some(heading), Some(body));
        dialog.add_response("ok", "OK");
        dialog.set_default_response(Some("ok"));
        dialog.present(Some(&self.window));
    }

    fn show_error(&self, heading: &str, body: &str) {
        let dialog = adw::AlertDialog::new(Some(heading), Some(body));
        dialog.add_response("close", "Close");
        dialog.set_response_appearance("close", adw::ResponseAppearance::Destructive);
        dialog.set_default_response(Some("close"));
        dialog.present(Some(&self.window));
    }

    fn choose_save_path(&self, title: &str, initial_name: &str, event: fn(PathBuf) -> ShellEvent) {
        let dialog = gtk4::FileDialog::builder()
            .title(title)
            .modal(true)
            .initial_name(initial_name)
            .build();

        let shell = self.clone();
        glib::spawn_future_local(async move {
            match dialog.save_future(Some(&shell.window)).await {
                Ok(file) => match file.path() {
                    Some(path) => shell.dispatch(event(path)),
                    None => shell.show_error("Export Failed", "Only local files are supported"),
                },
                Err(e) => log::debug!("Save dialog dismissed: {}", e),
            }
        });
    }

    fn choose_settings_file(&self) {
        let filter = gtk4::FileFilter::new();
        filter.set_name(Some("Settings (*.json)"));
        filter.add_suffix("json");
        let filters = gio::ListStore::new::<gtk4::FileFilter>();
        filters.append(&filter);

        let dialog = gtk4::FileDialog::builder()
            .title("Import Settings")
            .modal(true)
            .build();
        dialog.set_filters(Some(&filters));

        let shell = self.clone();
        glib::spawn_future_local(async move {
            match dialog.open_future(Some(&shell.window)).await {
                Ok(file) => match file.path() {
                    Some(path) => shell.dispatch(ShellEvent::ImportSettings(path)),
                    None => shell.show_error("Could not import config", "Only local files are supported"),
                },
                Err(e) => log::debug!("Open dialog dismissed: {}", e),
            }
        });
    }
}

pub struct QrWindow {
    pub window: adw::ApplicationWindow,
}

impl QrWindow {
    pub fn new(app: &adw::Application) -> Self {
        Self::load_css();

        let prefs = match config::load_preferences(&config::preferences_path()) {
            Ok(prefs) => prefs,
            Err(e) => {
                log::debug!("Using default preferences: {}", e);
                AppPreferences::default()
            }
        };
        Self::apply_color_scheme(&prefs);
        let prefs = Rc::new(RefCell::new(prefs));

        let tabs = ContentTabs::new();
        let options = OptionsPanel::new();

        let error_label = gtk4::Label::new(None);
        error_label.add_css_class("inline-error");
        error_label.set_xalign(0.0);
        error_label.set_wrap(true);
        error_label.set_selectable(true);

        // Settings column: options, actions, preview
        let side = gtk4::Box::new(gtk4::Orientation::Vertical, 12);
        side.set_margin_top(12);
        side.set_margin_bottom(12);
        side.set_margin_start(12);
        side.set_margin_end(12);
        side.set_width_request(340);
        side.append(&options.widget);

        let generate_button = gtk4::Button::builder()
            .label("Generate")
            .css_classes(vec!["suggested-action".to_string(), "pill".to_string()])
            .build();
        let export_button = gtk4::Button::builder()
            .label("Export as…")
            .css_classes(vec!["pill".to_string()])
            .build();

        let actions = gtk4::Box::new(gtk4::Orientation::Horizontal, 8);
        actions.set_halign(gtk4::Align::Center);
        actions.append(&generate_button);
        actions.append(&export_button);
        side.append(&actions);

        let export_settings_button = gtk4::Button::builder()
            .label("Export settings")
            .css_classes(vec!["flat".to_string()])
            .build();
        let import_settings_button = gtk4::Button::builder()
            .label("Import settings")
            .css_classes(vec!["flat".to_string()])
            .build();
        let exit_button = gtk4::Button::builder()
            .label("Exit")
            .css_classes(vec!["flat".to_string()])
            .build();

        let settings_actions = gtk4::Box::new(gtk4::Orientation::Horizontal, 8);
        settings_actions.set_halign(gtk4::Align::Center);
        settings_actions.append(&export_settings_button);
        settings_actions.append(&import_settings_button);
        settings_actions.append(&exit_button);
        side.append(&settings_actions);

        let preview_title = gtk4::Label::new(Some("Resulting Image"));
        preview_title.add_css_class("section-header");
        side.append(&preview_title);

        let preview = gtk4::Picture::new();
        preview.set_can_shrink(false);
        preview.set_halign(gtk4::Align::Center);
        preview.set_valign(gtk4::Align::Center);

        let preview_frame = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
        preview_frame.add_css_class("preview-frame");
        preview_frame.set_size_request(100, 100);
        preview_frame.append(&preview);
        side.append(&preview_frame);

        let side_scroll = gtk4::ScrolledWindow::builder()
            .hscrollbar_policy(gtk4::PolicyType::Never)
            .child(&side)
            .build();

        let body = gtk4::Box::new(gtk4::Orientation::Horizontal, 0);
        body.append(&tabs.widget);
        body.append(&gtk4::Separator::new(gtk4::Orientation::Vertical));
        body.append(&side_scroll);

        let content = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
        content.append(&error_label);
        content.append(&body);

        let menu_button = gtk4::MenuButton::builder()
            .icon_name(icon_name("open-menu-symbolic", &["open-menu"][..]))
            .tooltip_text("Menu")
            .build();

        let menu = gio::Menu::new();
        menu.append(Some("Live Preview"), Some("app.live-preview"));
        menu.append(Some("About"), Some("app.about"));
        menu_button.set_menu_model(Some(&menu));

        let header = adw::HeaderBar::new();
        header.pack_end(&menu_button);

        let toolbar_view = adw::ToolbarView::new();
        toolbar_view.add_top_bar(&header);
        toolbar_view.set_content(Some(&content));

        let window = adw::ApplicationWindow::builder()
            .application(app)
            .title(format!("Offline QR Code Generator {}", SOFTWARE_VERSION))
            .default_width(980)
            .default_height(720)
            .content(&toolbar_view)
            .build();

        let shell = Shell {
            window: window.clone(),
            tabs: tabs.clone(),
            options: options.clone(),
            preview,
            error_label,
            state: Rc::new(RefCell::new(FormState::default())),
            prefs: prefs.clone(),
            applying: Rc::new(Cell::new(false)),
        };
        shell.push_state_to_widgets();

        let on_field = {
            let shell = shell.clone();
            move || shell.dispatch(ShellEvent::FieldChanged)
        };
        let on_tab = {
            let shell = shell.clone();
            move || shell.dispatch(ShellEvent::TabChanged)
        };
        tabs.connect_changed(on_field.clone(), on_tab);
        options.connect_changed(on_field);

        let shell_ref = shell.clone();
        generate_button.connect_clicked(move |_| shell_ref.dispatch(ShellEvent::Generate));

        let shell_ref = shell.clone();
        export_button.connect_clicked(move |_| {
            shell_ref.choose_save_path("Export As", DEFAULT_EXPORT_NAME, ShellEvent::ExportImage);
        });

        let shell_ref = shell.clone();
        export_settings_button.connect_clicked(move |_| {
            shell_ref.choose_save_path(
                "Export Settings",
                DEFAULT_SETTINGS_NAME,
                ShellEvent::ExportSettings,
            );
        });

        let shell_ref = shell.clone();
        import_settings_button.connect_clicked(move |_| shell_ref.choose_settings_file());

        let shell_ref = shell.clone();
        exit_button.connect_clicked(move |_| shell_ref.dispatch(ShellEvent::Exit));

        let live_preview = prefs.borrow().live_preview;
        let live_action =
            gio::SimpleAction::new_stateful("live-preview", None, &live_preview.to_variant());
        let shell_ref = shell.clone();
        live_action.connect_activate(move |action, _| {
            let enabled = !action
                .state()
                .and_then(|state| state.get::<bool>())
                .unwrap_or(true);
            action.set_state(&enabled.to_variant());

            let saved = {
                let mut prefs = shell_ref.prefs.borrow_mut();
                prefs.live_preview = enabled;
                config::save_preferences(&config::preferences_path(), &prefs)
            };
            if let Err(e) = saved {
                log::error!("Failed to save preferences: {}", e);
            }
            if enabled {
                shell_ref.dispatch(ShellEvent::FieldChanged);
            }
        });
        app.add_action(&live_action);

        let about_action = gio::SimpleAction::new("about", None);
        let window_weak = window.downgrade();
        about_action.connect_activate(move |_, _| {
            if let Some(window) = window_weak.upgrade() {
                Self::show_about_dialog(&window);
            }
        });
        app.add_action(&about_action);

        Self { window }
    }

    fn apply_color_scheme(prefs: &AppPreferences) {
        let scheme = match prefs.color_scheme.as_str() {
            "light" => adw::ColorScheme::ForceLight,
            "dark" => adw::ColorScheme::ForceDark,
            _ => adw::ColorScheme::Default,
        };
        adw::StyleManager::default().set_color_scheme(scheme);
    }

    fn show_about_dialog(window: &adw::ApplicationWindow) {
        let about = adw::AboutDialog::builder()
            .application_name("Offline QR Code Generator")
            .application_icon("qr-code-symbolic")
            .developer_name("PlayRood")
            .version(SOFTWARE_VERSION)
            .comments(format!(
                "Generate QR codes fully offline ({})",
                SOFTWARE_NAME
            ))
            .website("https://github.com/PlayRood32/adw-qrcode")
            .license_type(gtk4::License::Gpl30)
            .build();

        about.present(Some(window));
    }

    fn load_css() {
        let provider = gtk4::CssProvider::new();


        provider.load_from_data(APP_CSS);

        let Some(display) = gtk4::gdk::Display::default() else {
            log::warn!("No display available, skipping stylesheet");
            return;
        };
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }

    pub fn present(&self) {
        self.window.present();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Properties GTK's CSS parser accepts; anything else is logged as a
    // parse error at startup.
    const GTK_PROPERTIES: &[&str] = &[
        "background",
        "border-radius",
        "color",
        "font-size",
        "letter-spacing",
        "opacity",
        "padding",
    ];

    #[test]
    fn test_stylesheet_uses_gtk_properties_only() {
        let declarations = APP_CSS
            .lines()
            .map(str::trim)
            .filter(|line| line.ends_with(';'))
            .filter_map(|line| line.split_once(':'))
            .map(|(property, _)| property.trim());

        for property in declarations {
            assert!(
                GTK_PROPERTIES.contains(&property),
                "unsupported property '{}'",
                property
            );
        }
    }
}
