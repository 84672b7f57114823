use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::engine::cache::{LazyCache, RequestKey};
use crate::engine::frame::FrameScheduler;
use crate::engine::layout::LayoutMode;
use crate::engine::source::InMemorySource;
use crate::io;
use crate::model::{Group, Item, Priority, TimelineStore, UndoAction, UndoHistory, Viewport};
use crate::ui;
use crate::ui::timeline_view::TimelineInteraction;

/// Main application state.
pub struct TimeloomApp {
    pub store: TimelineStore,
    pub viewport: Viewport,
    pub mode: LayoutMode,
    pub history: UndoHistory,
    pub cache: LazyCache,
    pub scheduler: FrameScheduler,
    pub selected: Option<Uuid>,
    pub scroll_y: f32,
    pub status_message: String,
    pub file_path: Option<PathBuf>,
    /// Unsaved changes since the last save or load.
    pub dirty: bool,
}

impl TimeloomApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        ui::theme::install_fonts(&cc.egui_ctx);
        ui::theme::apply_theme(&cc.egui_ctx);

        let mut cache = LazyCache::new(Arc::new(Self::demo_source()));
        cache.request(RequestKey::Groups {
            offset: 0,
            limit: 50,
        });
        cache.load_more();

        let now = Utc::now();
        Self {
            store: TimelineStore::new(),
            viewport: Viewport::new(now - Duration::days(10), now + Duration::days(25)),
            mode: LayoutMode::Gantt,
            history: UndoHistory::new(),
            cache,
            scheduler: FrameScheduler::new(),
            selected: None,
            scroll_y: 0.0,
            status_message: "Ready".to_string(),
            file_path: None,
            dirty: false,
        }
    }

    /// Demo dataset served through the lazy-loading pipeline, so the app
    /// exercises the same paths a remote backend would.
    fn demo_source() -> InMemorySource {
        let today = Utc::now();
        let day = |d: i64| today + Duration::days(d);

        let planning = Group::new("Planning");
        let build = Group::new("Build");
        let launch = Group::new("Launch");

        let mut items = Vec::new();
        let mut push = |title: &str,
                        start: i64,
                        end: Option<i64>,
                        group: &Group,
                        priority: Priority,
                        progress: Option<f32>| {
            let mut item = match end {
                Some(end) => Item::new(title, day(start), day(end)),
                None => Item::new_instant(title, day(start)),
            };
            item.group = Some(group.id);
            item.priority = priority;
            item.progress = progress;
            items.push(item);
        };

        push("Kickoff", -8, Some(-5), &planning, Priority::High, Some(1.0));
        push("Requirements", -5, Some(2), &planning, Priority::Medium, Some(0.6));
        push("Scope review", -4, Some(1), &planning, Priority::Low, Some(0.3));
        push("Plan approved", 2, None, &planning, Priority::Critical, None);

        push("API design", 2, Some(9), &build, Priority::High, Some(0.2));
        push("Backend", 4, Some(18), &build, Priority::High, Some(0.1));
        push("Frontend", 6, Some(20), &build, Priority::Medium, None);
        push("Integration", 14, Some(22), &build, Priority::Medium, None);
        push("QA pass", 18, Some(24), &build, Priority::Critical, None);

        push("Docs", 16, Some(23), &launch, Priority::Low, None);
        push("Release candidate", 24, None, &launch, Priority::Critical, None);
        push("Ship", 26, None, &launch, Priority::Critical, None);

        InMemorySource::new(items, vec![planning, build, launch])
    }

    // --- File operations ---

    pub fn new_timeline(&mut self) {
        self.store = TimelineStore::new();
        self.file_path = None;
        self.selected = None;
        self.history.clear();
        self.viewport.reset();
        self.dirty = false;
        self.status_message = "New timeline".to_string();
    }

    pub fn open_file(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Timeline", &["timeline.json", "json"])
            .pick_file()
        {
            match io::file::load_timeline(&path) {
                Ok(file) => {
                    self.store.replace_all(file.items, file.groups);
                    self.viewport = file.viewport;
                    self.mode = file.mode;
                    self.file_path = Some(path);
                    self.selected = None;
                    self.history.clear();
                    self.dirty = false;
                    self.status_message =
                        format!("Loaded {} items", self.store.items().len());
                }
                Err(e) => {
                    self.status_message = format!("Error loading: {}", e);
                }
            }
        }
    }

    pub fn save_file(&mut self) {
        if let Some(path) = self.file_path.clone() {
            let file = io::file::TimelineFile::capture(&self.store, &self.viewport, self.mode);
            match io::file::save_timeline(&file, &path) {
                Ok(()) => {
                    self.dirty = false;
                    self.status_message = "Timeline saved".to_string();
                }
                Err(e) => self.status_message = format!("Error saving: {}", e),
            }
        } else {
            self.save_file_as();
        }
    }

    pub fn save_file_as(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Timeline", &["timeline.json", "json"])
            .set_file_name("untitled.timeline.json")
            .save_file()
        {
            self.file_path = Some(path);
            self.save_file();
        }
    }

    pub fn export_csv(&mut self) {
        if self.store.items().is_empty() {
            self.status_message = "Nothing to export".to_string();
            return;
        }
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .set_file_name("timeline.csv")
            .save_file()
        {
            match io::export::export_csv(&self.store, &path) {
                Ok(count) => {
                    self.status_message = format!("Exported {} items to CSV", count);
                }
                Err(e) => {
                    self.status_message = format!("CSV export failed: {}", e);
                }
            }
        }
    }

    pub fn reload_from_source(&mut self) {
        self.store.replace_all(Vec::new(), Vec::new());
        self.selected = None;
        self.history.clear();
        self.cache.invalidate();
        self.cache.request(RequestKey::Groups {
            offset: 0,
            limit: 50,
        });
        self.cache.load_more();
        self.status_message = "Reloading...".to_string();
    }

    // --- Edit operations ---

    pub fn undo(&mut self) {
        if let Some(kind) = self.history.undo(&mut self.store, &mut self.viewport) {
            self.selected = None;
            self.dirty = true;
            self.status_message = format!("Undid {}", kind.label());
            self.scheduler.mark_dirty();
        }
    }

    pub fn redo(&mut self) {
        if let Some(kind) = self.history.redo(&mut self.store, &mut self.viewport) {
            self.selected = None;
            self.dirty = true;
            self.status_message = format!("Redid {}", kind.label());
            self.scheduler.mark_dirty();
        }
    }

    pub fn add_item_at_center(&mut self) {
        let center = self.viewport.start + self.viewport.duration() / 2;
        let start = self.viewport.snap_to_nice_time(center);
        let end = start + self.viewport.duration() / 8;
        let item = Item::new("New Item", start, end);
        match self.store.insert_item(item.clone()) {
            Ok(()) => {
                self.history.push(UndoAction::add(item.clone()));
                self.selected = Some(item.id);
                self.dirty = true;
                self.status_message = "Item added".to_string();
            }
            Err(e) => self.status_message = format!("Cannot add item: {}", e),
        }
    }

    pub fn delete_selected(&mut self) {
        let Some(id) = self.selected.take() else { return };
        if let Some(item) = self.store.remove_item(id) {
            self.status_message = format!("Deleted '{}'", item.title);
            self.history.push(UndoAction::delete(item));
            self.dirty = true;
        }
    }

    /// Zoom to fit is a discrete view jump, so it is recorded on the
    /// history; continuous wheel zoom/pan is not.
    pub fn zoom_to_fit(&mut self) {
        if self.store.items().is_empty() {
            self.status_message = "Nothing to fit".to_string();
            return;
        }
        let before = self.viewport.clone();
        self.viewport.zoom_to_fit(self.store.items().iter(), 0.1);
        self.history
            .push(UndoAction::viewport_change(before, self.viewport.clone()));
        self.status_message = "Fitted view to items".to_string();
    }

    fn toggle_group(&mut self, id: Uuid) {
        let Some(before) = self.store.group(id).cloned() else { return };
        self.store.toggle_group(id);
        let Some(after) = self.store.group(id).cloned() else { return };
        if !after.collapsed {
            // Expanding may reveal members the paged listing never reached.
            self.cache.request(RequestKey::Group(id));
        }
        self.history.push(UndoAction::group_change(before, after));
        self.scheduler.mark_dirty();
        self.scroll_y = self.scroll_y.max(0.0);
    }

    fn apply_interaction(&mut self, interaction: TimelineInteraction) {
        if let Some(edit) = interaction.committed_edit {
            self.status_message = format!(
                "{} '{}' ({} \u{2192} {})",
                edit.kind.label(),
                edit.after.title,
                edit.after.start.format("%Y-%m-%d %H:%M"),
                edit.after
                    .effective_end()
                    .format("%Y-%m-%d %H:%M"),
            );
            self.history
                .push(UndoAction::item_edit(edit.kind, edit.before, edit.after));
            self.dirty = true;
            self.scheduler.mark_dirty();
        }
        if let Some(group) = interaction.toggled_group {
            self.toggle_group(group);
        }
        if interaction.scrolled || interaction.viewport_changed {
            self.scheduler.note_scroll(Instant::now());
        }
        if interaction.reached_end {
            self.cache.load_more();
        }
    }
}

impl eframe::App for TimeloomApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        // Merge finished background fetches before anything reads the store.
        if self.cache.poll_completions(&mut self.store) > 0 {
            self.scheduler.mark_dirty();
        }

        // Keyboard shortcuts outside closures to avoid borrow issues
        let should_save = ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::S));
        let should_undo = ctx
            .input(|i| i.modifiers.ctrl && !i.modifiers.shift && i.key_pressed(egui::Key::Z));
        let should_redo = ctx.input(|i| {
            i.modifiers.ctrl
                && (i.key_pressed(egui::Key::Y)
                    || (i.modifiers.shift && i.key_pressed(egui::Key::Z)))
        });
        let should_delete = ctx.input(|i| i.key_pressed(egui::Key::Delete));
        if should_save {
            self.save_file();
        }
        if should_undo {
            self.undo();
        }
        if should_redo {
            self.redo();
        }
        if should_delete && self.selected.is_some() {
            self.delete_selected();
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        self.show_status_bar(ctx);

        let frame = egui::Frame::default()
            .fill(ui::theme::BG_DARK)
            .inner_margin(egui::Margin::ZERO);
        let mut interaction = TimelineInteraction::default();
        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            interaction = ui::timeline_view::show_timeline(
                &mut self.store,
                &mut self.viewport,
                self.mode,
                &mut self.selected,
                &mut self.scroll_y,
                ui,
            );
        });
        self.apply_interaction(interaction);

        // Preload around the window once scrolling has settled.
        if !self.scheduler.is_scrolling(now) {
            self.cache.preload_window(&self.viewport);
        }

        // State changed during this frame repaints on the next budget edge,
        // coalescing bursts of marks into one frame per 16 ms.
        if self.scheduler.should_render(now) {
            ctx.request_repaint();
        } else if let Some(delay) = self.scheduler.next_deadline(now) {
            ctx.request_repaint_after(delay);
        }

        if self.cache.is_loading() || self.scheduler.is_scrolling(now) {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}

impl TimeloomApp {
    fn show_status_bar(&mut self, ctx: &egui::Context) {
        let mut retry = false;
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(ui::theme::STATUS_BAR_HEIGHT)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_HEADER)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    if let Some(err) = self.cache.last_error() {
                        ui.label(
                            egui::RichText::new(format!("Load failed: {}", err))
                                .font(ui::theme::font_sub())
                                .color(ui::theme::STATUS_ERROR),
                        );
                        if ui.small_button("Retry").clicked() {
                            retry = true;
                        }
                    } else if self.cache.is_loading() {
                        ui.spinner();
                        ui.label(
                            egui::RichText::new("Loading...")
                                .font(ui::theme::font_sub())
                                .color(ui::theme::STATUS_LOADING),
                        );
                    } else {
                        ui.label(
                            egui::RichText::new(&self.status_message)
                                .font(ui::theme::font_sub())
                                .color(ui::theme::TEXT_SECONDARY),
                        );
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let total = self
                            .cache
                            .total()
                            .map(|t| format!(" / {}", t))
                            .unwrap_or_default();
                        ui.label(
                            egui::RichText::new(format!(
                                "Items: {}{}",
                                self.store.items().len(),
                                total
                            ))
                            .size(10.5)
                            .color(ui::theme::TEXT_DIM),
                        );
                        ui.label(
                            egui::RichText::new(" \u{00B7} ")
                                .size(10.5)
                                .color(ui::theme::TEXT_DIM),
                        );
                        ui.label(
                            egui::RichText::new(format!(
                                "{} \u{00B7} Zoom {:.0}%",
                                self.viewport.current_level().name,
                                self.viewport.zoom * 100.0
                            ))
                            .size(10.5)
                            .color(ui::theme::TEXT_DIM),
                        );
                    });
                });
            });
        if retry {
            self.cache.retry_last_failed();
            self.status_message = "Retrying...".to_string();
        }
    }
}
