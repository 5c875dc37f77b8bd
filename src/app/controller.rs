use std::collections::HashMap;

use crate::model::{FloorPlan, PlanSelection, Point, Shape, ShapeId, Unit, UnitId};
use crate::repo::{FloorPlanRepository, RepoError};

use super::drawing::{DrawEvent, PolygonDrawingEngine};
use super::hit::{HitFilter, Selection, hit_test};
use super::mapper::CoordinateMapper;
use super::registry::ShapeRegistry;
use super::viewport::ViewportTransform;

/// Drawing and selection are mutually exclusive interaction modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Mode {
    Select,
    Draw,
}

/// Stamps a load with the selection generation it was issued for, so a
/// response that settles after the user has moved on is discarded instead of
/// painting stale geometry over the wrong image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct LoadTicket {
    pub(super) selection: PlanSelection,
    generation: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub(super) enum ControllerEvent {
    ShapeCommitted(ShapeId),
    ShapeBound(ShapeId, Option<UnitId>),
    SelectionChanged(Option<ShapeId>),
    UnitDetailRequested(UnitId),
}

/// Owns the per-plan state (viewport, drawing session, shape registry, unit
/// table) and routes pointer gestures to the drawing engine or hit-testing
/// depending on mode. Collaborator failures surface through `error`, never
/// silently; geometry-level rejections are silent no-ops.
pub(super) struct FloorPlanController {
    selection: Option<PlanSelection>,
    generation: u64,
    plan: Option<FloorPlan>,
    registry: ShapeRegistry,
    units: HashMap<UnitId, Unit>,
    pub(super) viewport: ViewportTransform,
    pub(super) mapper: CoordinateMapper,
    drawing: PolygonDrawingEngine,
    shape_selection: Selection,
    mode: Mode,
    preview: bool,
    loading: bool,
    error: Option<String>,
    events: Vec<ControllerEvent>,
}

impl FloorPlanController {
    pub(super) fn new() -> Self {
        Self {
            selection: None,
            generation: 0,
            plan: None,
            registry: ShapeRegistry::default(),
            units: HashMap::new(),
            viewport: ViewportTransform::default(),
            mapper: CoordinateMapper::default(),
            drawing: PolygonDrawingEngine::default(),
            shape_selection: Selection::default(),
            mode: Mode::Select,
            preview: false,
            loading: false,
            error: None,
            events: Vec::new(),
        }
    }

    /// Switches to a new (entrance, floor): resets all ephemeral state and
    /// returns the ticket that the plan/unit responses must carry back.
    /// Unsaved edits are discarded; that is the product behavior.
    pub(super) fn select_plan(&mut self, selection: PlanSelection) -> LoadTicket {
        self.generation += 1;
        self.selection = Some(selection);
        self.plan = None;
        self.registry.load(Vec::new());
        self.units.clear();
        self.viewport.reset();
        self.mapper.clear();
        self.drawing.cancel();
        self.shape_selection.clear();
        self.loading = true;
        self.error = None;
        LoadTicket {
            selection,
            generation: self.generation,
        }
    }

    fn is_stale(&self, ticket: LoadTicket) -> bool {
        ticket.generation != self.generation
    }

    pub(super) fn apply_plan(
        &mut self,
        ticket: LoadTicket,
        result: Result<Option<FloorPlan>, RepoError>,
    ) {
        if self.is_stale(ticket) {
            log::debug!(
                "discarding stale floor plan response for entrance {} floor {}",
                ticket.selection.entrance,
                ticket.selection.floor
            );
            return;
        }
        self.loading = false;
        match result {
            Ok(Some(plan)) => {
                self.registry.load(plan.shapes.clone());
                self.plan = Some(plan);
            }
            Ok(None) => {
                self.plan = None;
                self.registry.load(Vec::new());
            }
            Err(e) => {
                log::error!("{e}");
                self.error = Some(e.to_string());
            }
        }
    }

    pub(super) fn apply_units(&mut self, ticket: LoadTicket, result: Result<Vec<Unit>, RepoError>) {
        if self.is_stale(ticket) {
            log::debug!(
                "discarding stale unit response for entrance {} floor {}",
                ticket.selection.entrance,
                ticket.selection.floor
            );
            return;
        }
        match result {
            Ok(units) => {
                self.units = units.into_iter().map(|u| (u.id, u)).collect();
            }
            Err(e) => {
                log::error!("{e}");
                self.error = Some(e.to_string());
            }
        }
    }

    pub(super) fn plan(&self) -> Option<&FloorPlan> {
        self.plan.as_ref()
    }

    pub(super) fn units(&self) -> &HashMap<UnitId, Unit> {
        &self.units
    }

    pub(super) fn unit_for_shape(&self, shape: &Shape) -> Option<&Unit> {
        shape.unit_id.and_then(|id| self.units.get(&id))
    }

    pub(super) fn registry(&self) -> &ShapeRegistry {
        &self.registry
    }

    pub(super) fn is_dirty(&self) -> bool {
        self.registry.is_dirty()
    }

    pub(super) fn loading(&self) -> bool {
        self.loading
    }

    pub(super) fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(super) fn clear_error(&mut self) {
        self.error = None;
    }

    pub(super) fn mode(&self) -> Mode {
        self.mode
    }

    pub(super) fn set_mode(&mut self, mode: Mode) {
        if mode != Mode::Draw {
            self.drawing.cancel();
        }
        self.mode = mode;
    }

    pub(super) fn preview(&self) -> bool {
        self.preview
    }

    /// Preview renders the public viewer: selection only, bound shapes only.
    pub(super) fn set_preview(&mut self, preview: bool) {
        self.preview = preview;
        if preview {
            self.set_mode(Mode::Select);
            self.shape_selection.clear();
        }
    }

    pub(super) fn drawing(&self) -> &PolygonDrawingEngine {
        &self.drawing
    }

    pub(super) fn near_close(&self, point: Point) -> bool {
        self.mapper
            .close_threshold()
            .map(|t| self.drawing.near_close(point, t))
            .unwrap_or(false)
    }

    pub(super) fn hovered_shape(&self) -> Option<&Shape> {
        self.shape_selection
            .hovered()
            .and_then(|id| self.registry.find_by_id(id))
    }

    pub(super) fn selected_shape(&self) -> Option<&Shape> {
        self.shape_selection
            .selected()
            .and_then(|id| self.registry.find_by_id(id))
    }

    fn hit_filter(&self) -> HitFilter<'_> {
        if self.preview {
            HitFilter::BoundResolvable(&self.units)
        } else {
            HitFilter::All
        }
    }

    pub(super) fn pointer_click(&mut self, point: Point) {
        if self.mode == Mode::Draw && !self.preview {
            let Ok(threshold) = self.mapper.close_threshold() else {
                return;
            };
            if let DrawEvent::ShapeClosed(points) = self.drawing.pointer_click(point, threshold) {
                self.commit_shape(points);
            }
        } else {
            let hit = hit_test(point, self.registry.all(), self.hit_filter()).map(|s| s.id);
            if self.shape_selection.select(hit) {
                self.events.push(ControllerEvent::SelectionChanged(hit));
            }
        }
    }

    pub(super) fn pointer_move(&mut self, point: Point) {
        if self.mode == Mode::Draw && !self.preview {
            return;
        }
        let hit = hit_test(point, self.registry.all(), self.hit_filter()).map(|s| s.id);
        self.shape_selection.hover(hit);
    }

    pub(super) fn pointer_left(&mut self) {
        self.shape_selection.pointer_left();
    }

    pub(super) fn cancel_drawing(&mut self) {
        self.drawing.cancel();
    }

    /// Vertices that drifted outside the image while drawing are rejected at
    /// commit; if fewer than three remain the commit is silently ignored.
    fn commit_shape(&mut self, points: Vec<Point>) {
        let Some(natural) = self.mapper.natural_size() else {
            return;
        };
        let kept: Vec<Point> = points
            .into_iter()
            .filter(|p| p.within(natural.x, natural.y))
            .collect();
        if let Ok(id) = self.registry.add(kept) {
            self.events.push(ControllerEvent::ShapeCommitted(id));
            if self.shape_selection.select(Some(id)) {
                self.events
                    .push(ControllerEvent::SelectionChanged(Some(id)));
            }
        }
    }

    pub(super) fn bind_selected(&mut self, unit_id: Option<UnitId>) {
        let Some(id) = self.shape_selection.selected() else {
            return;
        };
        if self.registry.rebind(id, unit_id) {
            self.events.push(ControllerEvent::ShapeBound(id, unit_id));
        }
    }

    pub(super) fn remove_selected(&mut self) {
        let Some(id) = self.shape_selection.selected() else {
            return;
        };
        if self.registry.remove(id) {
            self.shape_selection.forget(id);
            self.events.push(ControllerEvent::SelectionChanged(None));
        }
    }

    /// Viewer detail action: only meaningful for a selected shape whose unit
    /// resolves; the host owns the actual navigation.
    pub(super) fn request_unit_details(&mut self) {
        let Some(unit_id) = self
            .selected_shape()
            .and_then(|s| self.unit_for_shape(s))
            .map(|u| u.id)
        else {
            return;
        };
        self.events
            .push(ControllerEvent::UnitDetailRequested(unit_id));
    }

    /// Hands the registry's shapes to the repository. No partial save: on
    /// failure the previously persisted state stays authoritative.
    pub(super) fn save(&mut self, repo: &mut dyn FloorPlanRepository) -> bool {
        let Some(plan) = &self.plan else {
            self.error = Some("save floor plan failed: nothing to save".into());
            return false;
        };
        match repo.update(plan.id, self.registry.all()) {
            Ok(()) => {
                self.registry.mark_saved();
                self.error = None;
                true
            }
            Err(e) => {
                log::error!("{e}");
                self.error = Some(e.to_string());
                false
            }
        }
    }

    pub(super) fn delete_plan(&mut self, repo: &mut dyn FloorPlanRepository) -> bool {
        let Some(plan) = &self.plan else {
            return false;
        };
        match repo.delete(plan.id, &plan.image_url) {
            Ok(()) => {
                self.plan = None;
                self.registry.load(Vec::new());
                self.mapper.clear();
                self.viewport.reset();
                self.drawing.cancel();
                self.shape_selection.clear();
                self.error = None;
                true
            }
            Err(e) => {
                log::error!("{e}");
                self.error = Some(e.to_string());
                false
            }
        }
    }

    pub(super) fn upload_image(
        &mut self,
        repo: &mut dyn FloorPlanRepository,
        image_bytes: &[u8],
    ) -> bool {
        let Some(selection) = self.selection else {
            self.error = Some("upload floor plan image failed: no floor selected".into());
            return false;
        };
        match repo.create(selection.entrance, selection.floor, image_bytes) {
            Ok(plan) => {
                self.registry.load(plan.shapes.clone());
                self.plan = Some(plan);
                self.mapper.clear();
                self.viewport.reset();
                self.drawing.cancel();
                self.shape_selection.clear();
                self.error = None;
                true
            }
            Err(e) => {
                log::error!("{e}");
                self.error = Some(e.to_string());
                false
            }
        }
    }

    pub(super) fn drain_events(&mut self) -> Vec<ControllerEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UnitStatus;

    struct FakeRepo {
        plan: Option<FloorPlan>,
        fail: bool,
        updated: Option<(u64, Vec<Shape>)>,
    }

    impl FakeRepo {
        fn with_plan() -> Self {
            Self {
                plan: Some(FloorPlan {
                    id: 1,
                    entrance: 1,
                    floor: 1,
                    image_url: "images/plan-1.png".into(),
                    shapes: Vec::new(),
                }),
                fail: false,
                updated: None,
            }
        }
    }

    impl FloorPlanRepository for FakeRepo {
        fn fetch(&self, _entrance: u32, _floor: u32) -> Result<Option<FloorPlan>, RepoError> {
            if self.fail {
                return Err(RepoError::new("fetch floor plan", "backend unavailable"));
            }
            Ok(self.plan.clone())
        }

        fn create(
            &mut self,
            entrance: u32,
            floor: u32,
            _image_bytes: &[u8],
        ) -> Result<FloorPlan, RepoError> {
            if self.fail {
                return Err(RepoError::new("upload floor plan image", "backend unavailable"));
            }
            let plan = FloorPlan {
                id: 9,
                entrance,
                floor,
                image_url: "images/plan-9.png".into(),
                shapes: Vec::new(),
            };
            self.plan = Some(plan.clone());
            Ok(plan)
        }

        fn update(&mut self, id: u64, shapes: &[Shape]) -> Result<(), RepoError> {
            if self.fail {
                return Err(RepoError::new("save floor plan", "backend unavailable"));
            }
            self.updated = Some((id, shapes.to_vec()));
            Ok(())
        }

        fn delete(&mut self, _id: u64, _image_url: &str) -> Result<(), RepoError> {
            if self.fail {
                return Err(RepoError::new("delete floor plan", "backend unavailable"));
            }
            self.plan = None;
            Ok(())
        }
    }

    fn unit(id: UnitId, floor: u32, status: UnitStatus) -> Unit {
        Unit {
            id,
            entrance: 1,
            floor,
            number: format!("{id}"),
            area: 50.0,
            rooms: 2,
            price: 100_000,
            status,
        }
    }

    fn loaded_controller() -> FloorPlanController {
        let mut c = FloorPlanController::new();
        let repo = FakeRepo::with_plan();
        let ticket = c.select_plan(PlanSelection {
            entrance: 1,
            floor: 1,
        });
        c.apply_plan(ticket, repo.fetch(1, 1));
        c.apply_units(ticket, Ok(vec![unit(31, 1, UnitStatus::Sold)]));
        c.mapper.set_natural_size(800, 600);
        c
    }

    #[test]
    fn stale_unit_response_is_discarded() {
        let mut c = FloorPlanController::new();
        let ticket_floor1 = c.select_plan(PlanSelection {
            entrance: 1,
            floor: 1,
        });
        // The user switches floors while floor 1's fetch is still pending.
        let ticket_floor2 = c.select_plan(PlanSelection {
            entrance: 1,
            floor: 2,
        });

        c.apply_units(ticket_floor1, Ok(vec![unit(11, 1, UnitStatus::Available)]));
        assert!(c.units().is_empty());

        c.apply_units(ticket_floor2, Ok(vec![unit(21, 2, UnitStatus::Reserved)]));
        assert_eq!(c.units().len(), 1);
        assert!(c.units().contains_key(&21));
    }

    #[test]
    fn stale_plan_response_is_discarded() {
        let mut c = FloorPlanController::new();
        let old = c.select_plan(PlanSelection {
            entrance: 1,
            floor: 1,
        });
        let _current = c.select_plan(PlanSelection {
            entrance: 2,
            floor: 4,
        });
        c.apply_plan(
            old,
            Ok(Some(FloorPlan {
                id: 1,
                entrance: 1,
                floor: 1,
                image_url: "images/plan-1.png".into(),
                shapes: Vec::new(),
            })),
        );
        assert!(c.plan().is_none());
        assert!(c.loading());
    }

    #[test]
    fn draw_mode_click_sequence_commits_shape() {
        let mut c = loaded_controller();
        c.set_mode(Mode::Draw);
        c.pointer_click(Point::new(10.0, 10.0));
        c.pointer_click(Point::new(100.0, 10.0));
        c.pointer_click(Point::new(100.0, 100.0));
        // Threshold is 8.0 for an 800px-wide image; (12,12) snaps closed.
        c.pointer_click(Point::new(12.0, 12.0));

        let shapes = c.registry().all();
        assert_eq!(shapes.len(), 1);
        assert_eq!(
            shapes[0].points,
            vec![
                Point::new(10.0, 10.0),
                Point::new(100.0, 10.0),
                Point::new(100.0, 100.0),
            ]
        );
        let shape_id = shapes[0].id;
        let events = c.drain_events();
        assert!(events.contains(&ControllerEvent::ShapeCommitted(shape_id)));
        assert!(c.is_dirty());
    }

    #[test]
    fn cancel_leaves_registry_unchanged() {
        let mut c = loaded_controller();
        c.set_mode(Mode::Draw);
        c.pointer_click(Point::new(10.0, 10.0));
        c.pointer_click(Point::new(100.0, 10.0));
        c.cancel_drawing();
        assert!(!c.drawing().is_active());
        assert!(c.drawing().vertices().is_empty());
        assert!(c.registry().all().is_empty());
        assert!(!c.is_dirty());
    }

    #[test]
    fn out_of_bounds_vertices_are_rejected_at_commit() {
        let mut c = loaded_controller();
        c.set_mode(Mode::Draw);
        c.pointer_click(Point::new(10.0, 10.0));
        c.pointer_click(Point::new(100.0, 10.0));
        // Cursor left the image for this vertex.
        c.pointer_click(Point::new(900.0, 10.0));
        c.pointer_click(Point::new(100.0, 100.0));
        c.pointer_click(Point::new(12.0, 12.0));

        let shapes = c.registry().all();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].points.len(), 3);
        assert!(shapes[0].points.iter().all(|p| p.within(800.0, 600.0)));
    }

    #[test]
    fn commit_degenerating_below_three_vertices_is_ignored() {
        let mut c = loaded_controller();
        c.set_mode(Mode::Draw);
        c.pointer_click(Point::new(10.0, 10.0));
        c.pointer_click(Point::new(900.0, 10.0));
        c.pointer_click(Point::new(900.0, 700.0));
        c.pointer_click(Point::new(12.0, 12.0));
        assert!(c.registry().all().is_empty());
        assert!(c.drain_events().is_empty());
        assert!(c.error().is_none());
    }

    #[test]
    fn select_mode_click_selects_and_emits_event() {
        let mut c = loaded_controller();
        c.set_mode(Mode::Draw);
        c.pointer_click(Point::new(10.0, 10.0));
        c.pointer_click(Point::new(100.0, 10.0));
        c.pointer_click(Point::new(100.0, 100.0));
        c.pointer_click(Point::new(12.0, 12.0));
        c.set_mode(Mode::Select);
        c.drain_events();

        c.pointer_click(Point::new(80.0, 40.0));
        let selected = c.selected_shape().map(|s| s.id);
        assert!(selected.is_some());
        assert_eq!(
            c.drain_events(),
            vec![ControllerEvent::SelectionChanged(selected)]
        );

        c.pointer_click(Point::new(700.0, 500.0));
        assert!(c.selected_shape().is_none());
    }

    #[test]
    fn preview_ignores_unbound_shapes() {
        let mut c = loaded_controller();
        c.set_mode(Mode::Draw);
        c.pointer_click(Point::new(10.0, 10.0));
        c.pointer_click(Point::new(100.0, 10.0));
        c.pointer_click(Point::new(100.0, 100.0));
        c.pointer_click(Point::new(12.0, 12.0));
        c.set_preview(true);
        c.drain_events();

        c.pointer_click(Point::new(80.0, 40.0));
        assert!(c.selected_shape().is_none());
        assert!(c.drain_events().is_empty());
    }

    #[test]
    fn bound_shape_resolves_unit_in_preview() {
        let mut c = loaded_controller();
        c.set_mode(Mode::Draw);
        c.pointer_click(Point::new(10.0, 10.0));
        c.pointer_click(Point::new(100.0, 10.0));
        c.pointer_click(Point::new(100.0, 100.0));
        c.pointer_click(Point::new(12.0, 12.0));
        c.set_mode(Mode::Select);
        c.pointer_click(Point::new(80.0, 40.0));
        c.bind_selected(Some(31));
        c.set_preview(true);
        c.drain_events();

        c.pointer_click(Point::new(80.0, 40.0));
        let shape = c.selected_shape().expect("bound shape selectable");
        assert_eq!(c.unit_for_shape(shape).map(|u| u.id), Some(31));

        c.request_unit_details();
        assert!(
            c.drain_events()
                .contains(&ControllerEvent::UnitDetailRequested(31))
        );
    }

    #[test]
    fn save_hands_registry_to_repository() {
        let mut c = loaded_controller();
        let mut repo = FakeRepo::with_plan();
        c.set_mode(Mode::Draw);
        c.pointer_click(Point::new(10.0, 10.0));
        c.pointer_click(Point::new(100.0, 10.0));
        c.pointer_click(Point::new(100.0, 100.0));
        c.pointer_click(Point::new(12.0, 12.0));

        assert!(c.save(&mut repo));
        assert!(!c.is_dirty());
        let (id, shapes) = repo.updated.expect("update called");
        assert_eq!(id, 1);
        assert_eq!(shapes, c.registry().all());
    }

    #[test]
    fn failed_save_surfaces_error_and_keeps_dirty() {
        let mut c = loaded_controller();
        let mut repo = FakeRepo::with_plan();
        repo.fail = true;
        c.set_mode(Mode::Draw);
        c.pointer_click(Point::new(10.0, 10.0));
        c.pointer_click(Point::new(100.0, 10.0));
        c.pointer_click(Point::new(100.0, 100.0));
        c.pointer_click(Point::new(12.0, 12.0));

        assert!(!c.save(&mut repo));
        assert!(c.is_dirty());
        assert!(c.error().unwrap().contains("save floor plan"));
    }

    #[test]
    fn failed_fetch_surfaces_error_with_operation_name() {
        let mut c = FloorPlanController::new();
        let mut repo = FakeRepo::with_plan();
        repo.fail = true;
        let ticket = c.select_plan(PlanSelection {
            entrance: 1,
            floor: 1,
        });
        c.apply_plan(ticket, repo.fetch(1, 1));
        assert!(c.error().unwrap().contains("fetch floor plan"));
        assert!(!c.loading());
    }

    #[test]
    fn delete_plan_clears_state() {
        let mut c = loaded_controller();
        let mut repo = FakeRepo::with_plan();
        assert!(c.delete_plan(&mut repo));
        assert!(c.plan().is_none());
        assert!(c.registry().all().is_empty());
        assert!(!c.mapper.is_ready());
    }

    #[test]
    fn selection_change_resets_viewport_and_drawing() {
        let mut c = loaded_controller();
        c.viewport.zoom_in();
        c.set_mode(Mode::Draw);
        c.pointer_click(Point::new(10.0, 10.0));

        c.select_plan(PlanSelection {
            entrance: 1,
            floor: 2,
        });
        assert_eq!(c.viewport.scale(), 1.0);
        assert!(!c.drawing().is_active());
        assert!(c.registry().all().is_empty());
        assert!(c.loading());
    }
}
