use eframe::egui;
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::model::{Unit, UnitStatus};

use super::PlanmarkApp;
use super::controller::{ControllerEvent, Mode};
use super::render;

const MAX_ENTRANCE: u32 = 6;
const MAX_FLOOR: u32 = 24;

impl eframe::App for PlanmarkApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.input_mut(|i| {
            if i.consume_key(egui::Modifiers::NONE, egui::Key::Escape) {
                self.controller.cancel_drawing();
            }
        });

        self.ensure_texture(ctx);

        for event in self.controller.drain_events() {
            match event {
                ControllerEvent::ShapeCommitted(id) => {
                    log::info!("shape {id} committed");
                    self.status = Some("Shape added".to_string());
                }
                ControllerEvent::ShapeBound(id, Some(unit_id)) => {
                    log::info!("shape {id} bound to unit {unit_id}");
                    self.status = Some("Shape bound".to_string());
                }
                ControllerEvent::ShapeBound(id, None) => {
                    log::info!("shape {id} unbound");
                    self.status = Some("Shape unbound".to_string());
                }
                ControllerEvent::SelectionChanged(_) => {
                    self.binding_query.clear();
                }
                ControllerEvent::UnitDetailRequested(unit_id) => {
                    // Navigation to the unit page belongs to the host site.
                    log::info!("unit detail requested for unit {unit_id}");
                    self.status = Some(format!("Would open unit page for unit {unit_id}"));
                }
            }
        }

        self.top_bar(ctx);
        self.status_bar(ctx);
        self.side_panel(ctx);
        self.canvas(ctx);
    }
}

impl PlanmarkApp {
    fn top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.label("Entrance:");
                let mut entrance = self.entrance;
                egui::ComboBox::from_id_salt("entrance_select")
                    .selected_text(format!("{entrance}"))
                    .show_ui(ui, |ui| {
                        for e in 1..=MAX_ENTRANCE {
                            ui.selectable_value(&mut entrance, e, format!("{e}"));
                        }
                    });
                ui.label("Floor:");
                let mut floor = self.floor;
                egui::ComboBox::from_id_salt("floor_select")
                    .selected_text(format!("{floor}"))
                    .show_ui(ui, |ui| {
                        for f in 1..=MAX_FLOOR {
                            ui.selectable_value(&mut floor, f, format!("{f}"));
                        }
                    });
                if entrance != self.entrance || floor != self.floor {
                    self.entrance = entrance;
                    self.floor = floor;
                    self.reload();
                    self.persist_settings();
                }

                ui.separator();

                let preview = self.controller.preview();
                ui.add_enabled_ui(!preview, |ui| {
                    if ui
                        .selectable_label(self.controller.mode() == Mode::Select, "Select")
                        .clicked()
                    {
                        self.controller.set_mode(Mode::Select);
                    }
                    if ui
                        .selectable_label(self.controller.mode() == Mode::Draw, "Draw")
                        .clicked()
                    {
                        self.controller.set_mode(Mode::Draw);
                    }
                });
                if ui.selectable_label(preview, "Preview").clicked() {
                    self.controller.set_preview(!preview);
                }

                ui.separator();

                if ui.button("−").clicked() {
                    self.controller.viewport.zoom_out();
                }
                ui.label(format!("{:.0}%", self.controller.viewport.scale() * 100.0));
                if ui.button("+").clicked() {
                    self.controller.viewport.zoom_in();
                }
                if ui.button("Reset view").clicked() {
                    self.controller.viewport.reset();
                }

                ui.separator();

                let can_save =
                    self.controller.is_dirty() && self.controller.plan().is_some() && !preview;
                if ui.add_enabled(can_save, egui::Button::new("Save")).clicked()
                    && self.controller.save(&mut self.store)
                {
                    self.status = Some("Floor plan saved".to_string());
                }

                ui.add_enabled_ui(!preview, |ui| {
                    if ui.button("Upload image…").clicked() {
                        self.upload_image_dialog();
                    }
                    if self.controller.plan().is_some() && ui.button("Delete plan").clicked() {
                        if self.controller.delete_plan(&mut self.store) {
                            self.status = Some("Floor plan deleted".to_string());
                        }
                    }
                });
            });
        });
    }

    fn upload_image_dialog(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("images", &["png", "jpg", "jpeg"])
            .pick_file()
        else {
            return;
        };
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.status = Some(format!("could not read {}: {e}", path.display()));
                return;
            }
        };
        if self.controller.upload_image(&mut self.store, &bytes) {
            self.status = Some("Floor plan image uploaded".to_string());
        }
    }

    fn side_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("side_panel")
            .default_width(260.0)
            .show(ctx, |ui| {
                if self.controller.preview() {
                    self.unit_detail_panel(ui);
                } else {
                    self.binding_panel(ui);
                }
            });
    }

    fn unit_detail_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Unit");
        let Some(unit) = self
            .controller
            .selected_shape()
            .and_then(|s| self.controller.unit_for_shape(s))
            .cloned()
        else {
            ui.label("Click a unit on the plan.");
            return;
        };
        ui.label(format!("Number: {}", unit.number));
        ui.label(format!("Area: {:.1} m²", unit.area));
        ui.label(format!("Rooms: {}", unit.rooms));
        ui.label(format!("Price: {}", unit.price));
        ui.label(format!("Status: {}", status_label(unit.status)));
        ui.separator();
        if ui.button("Open unit page").clicked() {
            self.controller.request_unit_details();
        }
    }

    fn binding_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Shape");
        let Some(shape) = self.controller.selected_shape() else {
            ui.label(match self.controller.mode() {
                Mode::Draw => "Click the plan to trace a polygon; click near the first vertex to close it.",
                Mode::Select => "Click a shape to select it.",
            });
            return;
        };
        let bound = shape.unit_id;

        match bound.and_then(|id| self.controller.units().get(&id)) {
            Some(unit) => {
                ui.label(format!(
                    "Bound to unit {} ({})",
                    unit.number,
                    status_label(unit.status)
                ));
            }
            None if bound.is_some() => {
                ui.label("Bound to a unit not on this floor.");
            }
            None => {
                ui.label("Not bound to a unit.");
            }
        }

        if bound.is_some() && ui.button("Unbind").clicked() {
            self.controller.bind_selected(None);
        }
        if ui.button("Delete shape").clicked() {
            self.controller.remove_selected();
            return;
        }

        ui.separator();
        ui.label("Bind to unit:");
        ui.text_edit_singleline(&mut self.binding_query);

        let mut units: Vec<Unit> = self.controller.units().values().cloned().collect();
        units.sort_by(|a, b| a.number.cmp(&b.number));
        if !self.binding_query.is_empty() {
            let matcher = SkimMatcherV2::default();
            units.retain(|u| matcher.fuzzy_match(&u.number, &self.binding_query).is_some());
        }

        egui::ScrollArea::vertical().show(ui, |ui| {
            if units.is_empty() {
                ui.label("No matching units.");
            }
            for unit in units {
                let selected = bound == Some(unit.id);
                let label = format!("{} — {}", unit.number, status_label(unit.status));
                if ui.selectable_label(selected, label).clicked() {
                    self.controller.bind_selected(Some(unit.id));
                }
            }
        });
    }

    fn status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(error) = self.controller.error().map(str::to_string) {
                    ui.colored_label(egui::Color32::from_rgb(229, 57, 53), error);
                    if ui.small_button("✕").clicked() {
                        self.controller.clear_error();
                    }
                } else if let Some(status) = &self.status {
                    ui.label(status.clone());
                } else if self.controller.is_dirty() {
                    ui.label("Unsaved changes");
                }
            });
        });
    }

    fn canvas(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let (response, painter) =
                ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            render::draw_background(&painter, rect);

            if self.controller.loading() {
                render::draw_placeholder(&painter, rect, "Loading…");
                return;
            }
            if self.controller.plan().is_none() {
                render::draw_placeholder(
                    &painter,
                    rect,
                    "No floor plan for this selection. Upload an image to begin.",
                );
                return;
            }
            let Some(texture) = self.texture.clone() else {
                render::draw_placeholder(&painter, rect, "Floor plan image unavailable.");
                return;
            };

            if response.drag_started_by(egui::PointerButton::Middle) {
                if let Some(pos) = response.interact_pointer_pos() {
                    self.controller.viewport.begin_pan(pos);
                }
            }
            if response.dragged_by(egui::PointerButton::Middle) {
                if let Some(pos) = response.interact_pointer_pos() {
                    self.controller.viewport.continue_pan(pos);
                }
            }
            if response.drag_stopped_by(egui::PointerButton::Middle) {
                self.controller.viewport.end_pan();
            }

            let Ok(base) = self.controller.mapper.fitted_rect(rect) else {
                render::draw_placeholder(&painter, rect, "Floor plan image unavailable.");
                return;
            };
            let rendered = self.controller.viewport.apply(base);
            let painter = painter.with_clip_rect(rect);

            render::draw_plan_image(&painter, &texture, rendered);
            render::draw_shapes(
                &painter,
                &self.controller.mapper,
                rendered,
                self.controller.registry().all(),
                self.controller.units(),
                self.controller.hovered_shape().map(|s| s.id),
                self.controller.selected_shape().map(|s| s.id),
                self.controller.preview(),
            );

            let hover_image_point = response
                .hover_pos()
                .and_then(|pos| self.controller.mapper.to_image_space(pos, rendered).ok());

            if !self.controller.viewport.is_panning() {
                match hover_image_point {
                    Some(p) => self.controller.pointer_move(p),
                    None => self.controller.pointer_left(),
                }
                if response.clicked() {
                    if let Some(pos) = response.interact_pointer_pos() {
                        if let Ok(p) = self.controller.mapper.to_image_space(pos, rendered) {
                            self.controller.pointer_click(p);
                        }
                    }
                }
                if response.secondary_clicked() {
                    self.controller.cancel_drawing();
                }
            }

            if self.controller.drawing().is_active() {
                let near_close = hover_image_point
                    .map(|p| self.controller.near_close(p))
                    .unwrap_or(false);
                render::draw_in_progress(
                    &painter,
                    &self.controller.mapper,
                    rendered,
                    self.controller.drawing().vertices(),
                    response.hover_pos(),
                    near_close,
                );
            }

            if self.controller.mode() == Mode::Draw && !self.controller.preview() {
                ui.output_mut(|o| o.cursor_icon = egui::CursorIcon::Crosshair);
            } else if self.controller.hovered_shape().is_some() {
                ui.output_mut(|o| o.cursor_icon = egui::CursorIcon::PointingHand);
            }
        });
    }
}

fn status_label(status: UnitStatus) -> &'static str {
    match status {
        UnitStatus::Available => "available",
        UnitStatus::Reserved => "reserved",
        UnitStatus::Sold => "sold",
        UnitStatus::Unknown => "unknown",
    }
}
