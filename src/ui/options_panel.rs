// File: options_panel.rs
// Location: /src/ui/options_panel.rs

use gtk4::prelude::*;
use libadwaita::{self as adw, prelude::*};
use std::cell::Cell;
use std::rc::Rc;

use adwaita_qrcode::form::FormState;
use adwaita_qrcode::schema::{
    ErrorLevel, ExportFormat, QrMode, BORDER_RANGE, MICRO_MODE_LABEL, SCALE_RANGE,
    STANDARD_MODE_LABEL,
};

/// Entry row for a color with a picker button that writes `#RRGGBB` into it.
#[derive(Clone)]
struct ColorRow {
    entry: adw::EntryRow,
    button: gtk4::ColorDialogButton,
    syncing: Rc<Cell<bool>>,
}

fn rgba_to_hex(rgba: &gtk4::gdk::RGBA) -> String {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "#{:02X}{:02X}{:02X}",
        channel(rgba.red()),
        channel(rgba.green()),
        channel(rgba.blue())
    )
}

impl ColorRow {
    fn new(title: &str, initial: &str) -> Self {
        let entry = adw::EntryRow::builder().title(title).build();
        entry.set_text(initial);

        let dialog = gtk4::ColorDialog::builder()
            .title(title)
            .with_alpha(false)
            .build();
        let button = gtk4::ColorDialogButton::new(Some(dialog));
        button.set_valign(gtk4::Align::Center);
        entry.add_suffix(&button);

        let row = Self {
            entry,
            button,
            syncing: Rc::new(Cell::new(false)),
        };
        row.sync_button();

        let row_ref = row.clone();
        row.button.connect_rgba_notify(move |button| {
            if row_ref.syncing.get() {
                return;
            }
            row_ref.syncing.set(true);
            row_ref.entry.set_text(&rgba_to_hex(&button.rgba()));
            row_ref.syncing.set(false);
        });

        let row_ref = row.clone();
        row.entry.connect_changed(move |_| {
            if row_ref.syncing.get() {
                return;
            }
            row_ref.sync_button();
        });

        row
    }

    fn sync_button(&self) {
        if let Ok(rgba) = gtk4::gdk::RGBA::parse(self.entry.text().as_str()) {
            self.syncing.set(true);
            self.button.set_rgba(&rgba);
            self.syncing.set(false);
        }
    }

    fn text(&self) -> String {
        self.entry.text().to_string()
    }

    fn set_text(&self, value: &str) {
        if self.entry.text().as_str() != value {
            self.entry.set_text(value);
        }
    }
}

fn spin_row(
    title: &str,
    range: std::ops::RangeInclusive<u32>,
    initial: u32,
) -> (adw::ActionRow, gtk4::SpinButton) {
    let row = adw::ActionRow::builder().title(title).build();
    let adjustment = gtk4::Adjustment::new(
        f64::from(initial),
        f64::from(*range.start()),
        f64::from(*range.end()),
        1.0,
        1.0,
        0.0,
    );
    let spin = gtk4::SpinButton::builder()
        .adjustment(&adjustment)
        .numeric(true)
        .digits(0)
        .valign(gtk4::Align::Center)
        .build();
    spin.set_width_chars(3);
    row.add_suffix(&spin);
    (row, spin)
}

/// Generation and export settings shared by every content kind.
#[derive(Clone)]
pub struct OptionsPanel {
    pub widget: gtk4::Box,
    mode_combo: adw::ComboRow,
    error_combo: adw::ComboRow,
    scale_spin: gtk4::SpinButton,
    border_spin: gtk4::SpinButton,
    dark: ColorRow,
    light: ColorRow,
    data_dark: ColorRow,
    data_light: ColorRow,
    format_combo: adw::ComboRow,
}

impl OptionsPanel {
    pub fn new() -> Self {
        let defaults = FormState::default();

        let widget = gtk4::Box::new(gtk4::Orientation::Vertical, 12);

        let symbol_group = adw::PreferencesGroup::builder().title("Symbol").build();

        let mode_model = gtk4::StringList::new(&[STANDARD_MODE_LABEL, MICRO_MODE_LABEL][..]);
        let mode_combo = adw::ComboRow::builder()
            .title("Mode")
            .model(&mode_model)
            .selected(0)
            .build();

        let error_labels: Vec<&str> = ErrorLevel::ALL.iter().map(|l| l.label()).collect();
        let error_model = gtk4::StringList::new(&error_labels);
        let error_combo = adw::ComboRow::builder()
            .title("Error correction")
            .model(&error_model)
            .selected(defaults.error_level.index())
            .build();

        let (scale_row, scale_spin) = spin_row("Scale", SCALE_RANGE, defaults.scale);
        let (border_row, border_spin) = spin_row("Border", BORDER_RANGE, defaults.border);

        symbol_group.add(&mode_combo);
        symbol_group.add(&error_combo);
        symbol_group.add(&scale_row);
        symbol_group.add(&border_row);

        let color_group = adw::PreferencesGroup::builder()
            .title("Colors")
            .description("Data colors apply to PNG and SVG only")
            .build();

        let dark = ColorRow::new("Dark", &defaults.dark);
        let light = ColorRow::new("Light", &defaults.light);
        let data_dark = ColorRow::new("Data dark", &defaults.data_dark);
        let data_light = ColorRow::new("Data light", &defaults.data_light);

        color_group.add(&dark.entry);
        color_group.add(&light.entry);
        color_group.add(&data_dark.entry);
        color_group.add(&data_light.entry);

        let export_group = adw::PreferencesGroup::builder().title("Export").build();
        let format_labels: Vec<&str> = ExportFormat::ALL.iter().map(|f| f.extension()).collect();
        let format_model = gtk4::StringList::new(&format_labels);
        let format_combo = adw::ComboRow::builder()
            .title("Format")
            .model(&format_model)
            .selected(defaults.export_format.index())
            .build();
        export_group.add(&format_combo);

        widget.append(&symbol_group);
        widget.append(&color_group);
        widget.append(&export_group);

        Self {
            widget,
            mode_combo,
            error_combo,
            scale_spin,
            border_spin,
            dark,
            light,
            data_dark,
            data_light,
            format_combo,
        }
    }

    pub fn read_into(&self, state: &mut FormState) {
        state.mode = if self.mode_combo.selected() == 0 {
            QrMode::Standard
        } else {
            QrMode::Micro
        };
        state.error_level = ErrorLevel::from_index(self.error_combo.selected());
        state.scale = self.scale_spin.value_as_int().max(1) as u32;
        state.border = self.border_spin.value_as_int().max(1) as u32;
        state.dark = self.dark.text();
        state.light = self.light.text();
        state.data_dark = self.data_dark.text();
        state.data_light = self.data_light.text();
        state.export_format = ExportFormat::from_index(self.format_combo.selected());
    }

    pub fn write_from(&self, state: &FormState) {
        self.mode_combo.set_selected(match state.mode {
            QrMode::Standard => 0,
            QrMode::Micro => 1,
        });
        self.error_combo.set_selected(state.error_level.index());
        self.scale_spin.set_value(f64::from(state.scale));
        self.border_spin.set_value(f64::from(state.border));
        self.dark.set_text(&state.dark);
        self.light.set_text(&state.light);
        self.data_dark.set_text(&state.data_dark);
        self.data_light.set_text(&state.data_light);
        self.format_combo.set_selected(state.export_format.index());
    }

    pub fn connect_changed<F: Fn() + Clone + 'static>(&self, on_change: F) {
        for combo in [&self.mode_combo, &self.error_combo, &self.format_combo] {
            let on_change = on_change.clone();
            combo.connect_selected_notify(move |_| on_change());
        }
        for spin in [&self.scale_spin, &self.border_spin] {
            let on_change = on_change.clone();
            spin.connect_value_changed(move |_| on_change());
        }
        for row in [&self.dark, &self.light, &self.data_dark, &self.data_light] {
            let on_change = on_change.clone();
            row.entry.connect_changed(move |_| on_change());
        }
    }
}
