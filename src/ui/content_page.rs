// File: content_page.rs
// Location: /src/ui/content_page.rs

use gtk4::prelude::*;
use libadwaita::{self as adw, prelude::*};
use std::collections::BTreeMap;
use std::rc::Rc;

use adwaita_qrcode::form::FormState;
use adwaita_qrcode::schema::{ContentKind, FieldType};

use crate::ui::icon_name;

type EntryMap = BTreeMap<(ContentKind, &'static str), adw::EntryRow>;

/// One tab per content kind, each holding an entry row per field.
#[derive(Clone)]
pub struct ContentTabs {
    pub widget: gtk4::Box,
    view_stack: adw::ViewStack,
    entries: Rc<EntryMap>,
}

impl ContentTabs {
    pub fn new() -> Self {
        let widget = gtk4::Box::new(gtk4::Orientation::Vertical, 6);
        widget.set_hexpand(true);

        let view_stack = adw::ViewStack::new();
        view_stack.set_vexpand(true);

        let mut entries = EntryMap::new();

        for kind in ContentKind::ALL {
            let group = adw::PreferencesGroup::builder()
                .title(kind.name())
                .description("Fields marked with * are required")
                .build();

            for spec in kind.fields() {
                let title = if spec.required {
                    format!("{} *", spec.label())
                } else {
                    spec.label()
                };
                let entry = adw::EntryRow::builder().title(title).build();
                if spec.field_type == FieldType::Float {
                    entry.set_input_purpose(gtk4::InputPurpose::Number);
                }
                group.add(&entry);
                entries.insert((kind, spec.name), entry);
            }

            let content = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
            content.set_margin_top(12);
            content.set_margin_bottom(12);
            content.set_margin_start(12);
            content.set_margin_end(12);
            content.append(&group);

            // vCard has far more fields than fit on screen
            let scrolled = gtk4::ScrolledWindow::builder()
                .hscrollbar_policy(gtk4::PolicyType::Never)
                .vexpand(true)
                .child(&content)
                .build();

            let page = view_stack.add_titled(&scrolled, Some(kind.name()), kind.name());
            page.set_icon_name(Some(icon_name(kind.icon(), &["text-x-generic-symbolic"][..])));
        }

        let switcher = adw::ViewSwitcher::builder()
            .stack(&view_stack)
            .policy(adw::ViewSwitcherPolicy::Wide)
            .build();

        let switcher_scroll = gtk4::ScrolledWindow::builder()
            .vscrollbar_policy(gtk4::PolicyType::Never)
            .child(&switcher)
            .build();

        widget.append(&switcher_scroll);
        widget.append(&view_stack);

        Self {
            widget,
            view_stack,
            entries: Rc::new(entries),
        }
    }

    pub fn active_kind(&self) -> ContentKind {
        self.view_stack
            .visible_child_name()
            .and_then(|name| ContentKind::from_name(&name))
            .unwrap_or_default()
    }

    pub fn select(&self, kind: ContentKind) {
        self.view_stack.set_visible_child_name(kind.name());
    }

    pub fn read_into(&self, state: &mut FormState) {
        state.active_kind = self.active_kind();
        for ((kind, name), entry) in self.entries.iter() {
            state.set_field(*kind, name, entry.text().to_string());
        }
    }

    pub fn write_from(&self, state: &FormState) {
        for ((kind, name), entry) in self.entries.iter() {
            let value = state.field(*kind, name);
            if entry.text().as_str() != value {
                entry.set_text(value);
            }
        }
        self.select(state.active_kind);
    }

    pub fn connect_changed<F, T>(&self, on_field: F, on_tab: T)
    where
        F: Fn() + Clone + 'static,
        T: Fn() + 'static,
    {
        for entry in self.entries.values() {
            let on_field = on_field.clone();
            entry.connect_changed(move |_| on_field());
        }
        self.view_stack.connect_visible_child_notify(move |_| on_tab());
    }
}
