use eframe::egui;

use crate::model::PlanSelection;
use crate::repo::{FloorPlanRepository, JsonStore, UnitDirectory};

mod controller;
mod drawing;
mod hit;
mod mapper;
mod registry;
mod render;
mod settings;
mod status;
mod update;
mod viewport;

use controller::FloorPlanController;

pub struct PlanmarkApp {
    controller: FloorPlanController,
    store: JsonStore,
    texture: Option<egui::TextureHandle>,
    texture_url: Option<String>,
    entrance: u32,
    floor: u32,
    binding_query: String,
    settings_path: String,
    data_dir: String,
    status: Option<String>,
}

impl PlanmarkApp {
    fn config_path() -> Option<String> {
        if let Some(home) = std::env::var_os("HOME") {
            let path = std::path::PathBuf::from(home)
                .join(".config")
                .join("planmark.toml");
            if path.exists() {
                return Some(path.display().to_string());
            }
        }
        if std::path::Path::new("settings.toml").exists() {
            return Some("settings.toml".to_string());
        }
        None
    }

    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let settings_path = Self::config_path().unwrap_or_else(|| "settings.toml".to_string());
        let settings = settings::load_settings(&settings_path)
            .or_else(|| settings::load_settings("settings.json"))
            .unwrap_or_default();

        let mut app = Self {
            controller: FloorPlanController::new(),
            store: JsonStore::new(&settings.data_dir),
            texture: None,
            texture_url: None,
            entrance: settings.entrance,
            floor: settings.floor,
            binding_query: String::new(),
            settings_path,
            data_dir: settings.data_dir,
            status: None,
        };
        app.reload();
        app
    }

    /// Loads the plan and unit table for the current (entrance, floor). The
    /// store answers synchronously; the ticket still guards against a stale
    /// apply if a different selection happens in between.
    fn reload(&mut self) {
        let selection = PlanSelection {
            entrance: self.entrance,
            floor: self.floor,
        };
        let ticket = self.controller.select_plan(selection);
        let plan = self.store.fetch(selection.entrance, selection.floor);
        self.controller.apply_plan(ticket, plan);
        let units = self.store.list_units(selection.entrance, selection.floor);
        self.controller.apply_units(ticket, units);
        self.texture = None;
        self.texture_url = None;
        self.binding_query.clear();
    }

    fn persist_settings(&self) {
        let settings = settings::AppSettings {
            data_dir: self.data_dir.clone(),
            entrance: self.entrance,
            floor: self.floor,
        };
        if let Err(e) = settings::save_settings(&self.settings_path, &settings) {
            log::warn!("could not save settings to {}: {e}", self.settings_path);
        }
    }

    /// Uploads the current plan's image into a GPU texture once per plan and
    /// tells the mapper the image's natural size. Decode failures are sticky
    /// so a broken image does not retry every frame.
    fn ensure_texture(&mut self, ctx: &egui::Context) {
        let Some(plan) = self.controller.plan() else {
            self.texture = None;
            self.texture_url = None;
            return;
        };
        if self.texture_url.as_deref() == Some(plan.image_url.as_str()) {
            return;
        }
        let image_url = plan.image_url.clone();
        match self.store.load_image(&image_url) {
            Ok(img) => {
                let size = [img.width() as usize, img.height() as usize];
                let rgba = img.to_rgba8();
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &rgba);
                self.texture = Some(ctx.load_texture(
                    "floor-plan",
                    color_image,
                    egui::TextureOptions::LINEAR,
                ));
                self.controller
                    .mapper
                    .set_natural_size(img.width(), img.height());
            }
            Err(e) => {
                log::error!("{e}");
                self.status = Some(e.to_string());
                self.texture = None;
            }
        }
        self.texture_url = Some(image_url);
    }
}
