use std::fmt;
use std::fs;
use std::path::PathBuf;

use crate::model::{FloorPlan, PlanId, Shape, Unit};

/// A collaborator call failed. Carries the operation name so the UI can say
/// which action to retry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoError {
    op: &'static str,
    message: String,
}

impl RepoError {
    pub fn new(op: &'static str, message: impl Into<String>) -> Self {
        Self {
            op,
            message: message.into(),
        }
    }

    pub fn op(&self) -> &'static str {
        self.op
    }
}

impl fmt::Display for RepoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.op, self.message)
    }
}

impl std::error::Error for RepoError {}

pub type RepoResult<T> = Result<T, RepoError>;

pub trait FloorPlanRepository {
    fn fetch(&self, entrance: u32, floor: u32) -> RepoResult<Option<FloorPlan>>;
    fn create(&mut self, entrance: u32, floor: u32, image_bytes: &[u8]) -> RepoResult<FloorPlan>;
    fn update(&mut self, id: PlanId, shapes: &[Shape]) -> RepoResult<()>;
    fn delete(&mut self, id: PlanId, image_url: &str) -> RepoResult<()>;
}

pub trait UnitDirectory {
    fn list_units(&self, entrance: u32, floor: u32) -> RepoResult<Vec<Unit>>;
}

/// File-backed store: `plans.json` and `units.json` under a data directory,
/// uploaded floor-plan images under `images/`. Image URLs are paths relative
/// to the data directory.
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn plans_path(&self) -> PathBuf {
        self.root.join("plans.json")
    }

    fn units_path(&self) -> PathBuf {
        self.root.join("units.json")
    }

    pub fn image_path(&self, image_url: &str) -> PathBuf {
        self.root.join(image_url)
    }

    pub fn load_image(&self, image_url: &str) -> RepoResult<image::DynamicImage> {
        let path = self.image_path(image_url);
        let bytes = fs::read(&path)
            .map_err(|e| RepoError::new("load floor plan image", format!("{}: {e}", path.display())))?;
        image::load_from_memory(&bytes)
            .map_err(|e| RepoError::new("load floor plan image", e.to_string()))
    }

    fn read_plans(&self) -> RepoResult<Vec<FloorPlan>> {
        let path = self.plans_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let s = fs::read_to_string(&path)
            .map_err(|e| RepoError::new("fetch floor plan", e.to_string()))?;
        serde_json::from_str(&s).map_err(|e| RepoError::new("fetch floor plan", e.to_string()))
    }

    fn write_plans(&self, plans: &[FloorPlan]) -> RepoResult<()> {
        fs::create_dir_all(&self.root)
            .map_err(|e| RepoError::new("save floor plan", e.to_string()))?;
        let json = serde_json::to_string_pretty(plans)
            .map_err(|e| RepoError::new("save floor plan", e.to_string()))?;
        fs::write(self.plans_path(), json)
            .map_err(|e| RepoError::new("save floor plan", e.to_string()))
    }

    fn image_extension(bytes: &[u8]) -> RepoResult<&'static str> {
        match image::guess_format(bytes) {
            Ok(image::ImageFormat::Png) => Ok("png"),
            Ok(image::ImageFormat::Jpeg) => Ok("jpg"),
            Ok(other) => Err(RepoError::new(
                "upload floor plan image",
                format!("unsupported image format {other:?}"),
            )),
            Err(e) => Err(RepoError::new("upload floor plan image", e.to_string())),
        }
    }
}

impl FloorPlanRepository for JsonStore {
    fn fetch(&self, entrance: u32, floor: u32) -> RepoResult<Option<FloorPlan>> {
        let plans = self.read_plans()?;
        Ok(plans
            .into_iter()
            .find(|p| p.entrance == entrance && p.floor == floor))
    }

    fn create(&mut self, entrance: u32, floor: u32, image_bytes: &[u8]) -> RepoResult<FloorPlan> {
        // Validate the upload before touching the store.
        image::load_from_memory(image_bytes)
            .map_err(|e| RepoError::new("upload floor plan image", e.to_string()))?;
        let ext = Self::image_extension(image_bytes)?;

        let mut plans = self.read_plans()?;
        let id = plans.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let image_url = format!("images/plan-{id}.{ext}");

        let images_dir = self.root.join("images");
        fs::create_dir_all(&images_dir)
            .map_err(|e| RepoError::new("upload floor plan image", e.to_string()))?;
        fs::write(self.image_path(&image_url), image_bytes)
            .map_err(|e| RepoError::new("upload floor plan image", e.to_string()))?;

        // One plan per (entrance, floor) is the intended usage: replace any
        // existing plan for the pair and drop its image.
        if let Some(old) = plans
            .iter()
            .find(|p| p.entrance == entrance && p.floor == floor)
        {
            let old_image = self.image_path(&old.image_url);
            if let Err(e) = fs::remove_file(&old_image) {
                log::warn!("could not remove replaced image {}: {e}", old_image.display());
            }
        }
        plans.retain(|p| !(p.entrance == entrance && p.floor == floor));

        let plan = FloorPlan {
            id,
            entrance,
            floor,
            image_url,
            shapes: Vec::new(),
        };
        plans.push(plan.clone());
        self.write_plans(&plans)?;
        Ok(plan)
    }

    fn update(&mut self, id: PlanId, shapes: &[Shape]) -> RepoResult<()> {
        let mut plans = self.read_plans()?;
        let Some(plan) = plans.iter_mut().find(|p| p.id == id) else {
            return Err(RepoError::new(
                "save floor plan",
                format!("no floor plan with id {id}"),
            ));
        };
        plan.shapes = shapes.to_vec();
        self.write_plans(&plans)
    }

    fn delete(&mut self, id: PlanId, image_url: &str) -> RepoResult<()> {
        let mut plans = self.read_plans()?;
        let before = plans.len();
        plans.retain(|p| p.id != id);
        if plans.len() == before {
            return Err(RepoError::new(
                "delete floor plan",
                format!("no floor plan with id {id}"),
            ));
        }
        self.write_plans(&plans)?;
        let image = self.image_path(image_url);
        if let Err(e) = fs::remove_file(&image) {
            log::warn!("could not remove image {}: {e}", image.display());
        }
        Ok(())
    }
}

impl UnitDirectory for JsonStore {
    fn list_units(&self, entrance: u32, floor: u32) -> RepoResult<Vec<Unit>> {
        let path = self.units_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let s = fs::read_to_string(&path)
            .map_err(|e| RepoError::new("fetch units", e.to_string()))?;
        let units: Vec<Unit> =
            serde_json::from_str(&s).map_err(|e| RepoError::new("fetch units", e.to_string()))?;
        Ok(units
            .into_iter()
            .filter(|u| u.entrance == entrance && u.floor == floor)
            .collect())
    }
}
