//! The actor arena: placement, the tick protocol, and spatial queries.

use std::any::{Any, TypeId};
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

use crate::grid;
use crate::shape::BoundingBox;
use crate::sprite::Sprite;

use super::actor::{ActFailure, Actor, ActorHook, ActorId};

/// Inset applied to bounding rectangles in point and intersection
/// queries so that merely edge-adjacent actors do not register.
const QUERY_EDGE_INSET: f64 = 0.5;

/// Per-world behavior, invoked at the start of every tick and around
/// run-state changes.
pub trait WorldHook: Any {
    fn act(&mut self, _world: &mut World) -> Result<(), ActFailure> {
        Ok(())
    }

    fn started(&mut self, _world: &mut World) {}

    fn stopped(&mut self, _world: &mut World) {}
}

#[derive(Debug, Error)]
pub enum TickError {
    #[error("world hook failed: {0}")]
    WorldHook(#[source] ActFailure),
    #[error("act failed for actor {id}: {source}")]
    Actor {
        id: ActorId,
        #[source]
        source: ActFailure,
    },
}

struct Slot {
    id: ActorId,
    actor: Actor,
    hook: Option<Box<dyn ActorHook>>,
    hook_type: TypeId,
}

/// Cell-grid world holding actors in insertion order.
pub struct World {
    width: i32,
    height: i32,
    cell_size: i32,
    bounded: bool,
    background: Sprite,
    text_overlays: HashMap<(i32, i32), String>,
    slots: Vec<Slot>,
    next_id: u64,
    paint_order: Vec<TypeId>,
    hook: Option<Box<dyn WorldHook>>,
    redraw: Rc<Cell<bool>>,
}

impl World {
    /// Bounded world of `width x height` cells, each `cell_size` pixels
    /// square. Actors are kept inside the grid.
    pub fn new(width: i32, height: i32, cell_size: i32) -> Self {
        Self::build(width, height, cell_size, true)
    }

    /// Unbounded variant: coordinates outside the grid are legal.
    pub fn unbounded(width: i32, height: i32, cell_size: i32) -> Self {
        Self::build(width, height, cell_size, false)
    }

    fn build(width: i32, height: i32, cell_size: i32, bounded: bool) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let cell_size = cell_size.max(1);
        let redraw = Rc::new(Cell::new(true));
        let background = Sprite::new((width * cell_size) as u32, (height * cell_size) as u32);
        background.set_draw_color([255, 255, 255, 255]);
        background.fill();
        background.watch(&redraw);
        Self {
            width,
            height,
            cell_size,
            bounded,
            background,
            text_overlays: HashMap::new(),
            slots: Vec::new(),
            next_id: 0,
            paint_order: Vec::new(),
            hook: None,
            redraw,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn cell_size(&self) -> i32 {
        self.cell_size
    }

    pub fn is_bounded(&self) -> bool {
        self.bounded
    }

    pub fn width_px(&self) -> u32 {
        (self.width * self.cell_size) as u32
    }

    pub fn height_px(&self) -> u32 {
        (self.height * self.cell_size) as u32
    }

    pub fn set_hook<H: WorldHook>(&mut self, hook: H) {
        self.hook = Some(Box::new(hook));
    }

    // --- population -----------------------------------------------------

    /// Adds an actor with the placeholder sprite at the given cell.
    pub fn add_object<H: ActorHook>(&mut self, hook: H, cell_x: i32, cell_y: i32) -> ActorId {
        self.add_object_with(Actor::new(Sprite::placeholder()), hook, cell_x, cell_y)
    }

    /// Adds a prebuilt actor. Its sprite starts reporting redraws to
    /// this world, and the hook's `added_to_world` runs after placement.
    pub fn add_object_with<H: ActorHook>(
        &mut self,
        mut actor: Actor,
        hook: H,
        cell_x: i32,
        cell_y: i32,
    ) -> ActorId {
        let id = ActorId(self.next_id);
        self.next_id += 1;
        actor.sprite().watch(&self.redraw);
        let px = self.placed_pixel(cell_x, self.width);
        let py = self.placed_pixel(cell_y, self.height);
        actor.set_pixel_location(px, py);
        self.slots.push(Slot {
            id,
            actor,
            hook: Some(Box::new(hook)),
            hook_type: TypeId::of::<H>(),
        });
        self.mark_redraw();
        if let Some(mut hook) = self.take_hook(id) {
            hook.added_to_world(self, id);
            self.restore_hook(id, hook);
        }
        id
    }

    /// Removes the actor and returns its spatial state. The behavior
    /// hook is dropped; removal during the actor's own act is legal.
    pub fn remove_object(&mut self, id: ActorId) -> Option<Actor> {
        let index = self.slots.iter().position(|slot| slot.id == id)?;
        let slot = self.slots.remove(index);
        slot.actor.sprite().unwatch(&self.redraw);
        self.mark_redraw();
        Some(slot.actor)
    }

    pub fn remove_objects(&mut self, ids: &[ActorId]) {
        for id in ids {
            self.remove_object(*id);
        }
    }

    pub fn number_of_objects(&self) -> usize {
        self.slots.len()
    }

    pub fn contains_actor(&self, id: ActorId) -> bool {
        self.slot(id).is_some()
    }

    // --- spatial state ---------------------------------------------------

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.slot(id).map(|slot| &slot.actor)
    }

    /// Pixel-center position.
    pub fn location(&self, id: ActorId) -> Option<(i32, i32)> {
        self.actor(id).map(Actor::location)
    }

    pub fn cell_location(&self, id: ActorId) -> Option<(i32, i32)> {
        self.location(id).map(|(x, y)| {
            (
                grid::pixel_to_cell(x, self.cell_size),
                grid::pixel_to_cell(y, self.cell_size),
            )
        })
    }

    /// Places the actor at the center of the given cell. In a bounded
    /// world out-of-range cells land on the nearest in-bounds cell
    /// center.
    pub fn set_location(&mut self, id: ActorId, cell_x: i32, cell_y: i32) {
        let px = self.placed_pixel(cell_x, self.width);
        let py = self.placed_pixel(cell_y, self.height);
        if let Some(slot) = self.slot_mut(id) {
            slot.actor.set_pixel_location(px, py);
            self.mark_redraw();
        }
    }

    fn placed_pixel(&self, cell: i32, extent_cells: i32) -> i32 {
        let px = grid::cell_to_pixel_center(cell, self.cell_size);
        if self.bounded {
            let clamped = grid::clamp_to_bounds(px, extent_cells, self.cell_size);
            grid::cell_to_pixel_center(
                grid::pixel_to_cell(clamped, self.cell_size),
                self.cell_size,
            )
        } else {
            px
        }
    }

    /// Moves the actor `distance` cells along its current rotation,
    /// then re-places it (clamping and cell centering reapply).
    pub fn move_by(&mut self, id: ActorId, distance: i32) {
        let Some((cell_x, cell_y)) = self.cell_location(id) else {
            return;
        };
        let Some(actor) = self.actor(id) else {
            return;
        };
        let radians = (actor.rotation() as f64).to_radians();
        let dx = (radians.cos() * distance as f64).round() as i32;
        let dy = (radians.sin() * distance as f64).round() as i32;
        self.set_location(id, cell_x + dx, cell_y + dy);
    }

    pub fn rotation(&self, id: ActorId) -> Option<i32> {
        self.actor(id).map(Actor::rotation)
    }

    pub fn set_rotation(&mut self, id: ActorId, degrees: i32) {
        if let Some(slot) = self.slot_mut(id) {
            slot.actor.set_rotation(degrees);
            self.mark_redraw();
        }
    }

    pub fn turn(&mut self, id: ActorId, degrees: i32) {
        if let Some(slot) = self.slot_mut(id) {
            slot.actor.turn(degrees);
            self.mark_redraw();
        }
    }

    /// Rotates the actor to face a pixel position. Facing the actor's
    /// own position leaves the rotation unchanged.
    pub fn turn_towards(&mut self, id: ActorId, target_x: i32, target_y: i32) {
        let Some((x, y)) = self.location(id) else {
            return;
        };
        let dx = target_x - x;
        let dy = target_y - y;
        if dx == 0 && dy == 0 {
            return;
        }
        let degrees = (dy as f64).atan2(dx as f64).to_degrees().round() as i32;
        self.set_rotation(id, degrees);
    }

    /// Swaps the actor's sprite; the new sprite reports redraws here
    /// instead of the old one. Position is untouched, so the new image
    /// stays centered on the cell.
    pub fn set_actor_image(&mut self, id: ActorId, sprite: Sprite) {
        let redraw = self.redraw.clone();
        if let Some(slot) = self.slot_mut(id) {
            slot.actor.sprite().unwatch(&redraw);
            sprite.watch(&redraw);
            slot.actor.set_image(sprite);
            self.mark_redraw();
        }
    }

    /// True when the actor occupies a cell on the outer ring of the
    /// grid (or outside it, in an unbounded world).
    pub fn is_at_edge(&self, id: ActorId) -> bool {
        match self.cell_location(id) {
            Some((cx, cy)) => {
                cx <= 0 || cy <= 0 || cx >= self.width - 1 || cy >= self.height - 1
            }
            None => false,
        }
    }

    // --- behavior hooks --------------------------------------------------

    /// Mutable access to an actor's behavior state.
    pub fn hook_mut<T: ActorHook>(&mut self, id: ActorId) -> Option<&mut T> {
        let slot = self.slot_mut(id)?;
        let hook = slot.hook.as_mut()?;
        let any: &mut dyn Any = hook.as_mut();
        any.downcast_mut::<T>()
    }

    /// Runs one simulation tick: the world hook first, then every actor
    /// present at that point, in the current act sequence. Actors
    /// removed mid-tick are skipped; actors added mid-tick act from the
    /// next tick. The first hook failure aborts the remainder.
    pub fn run_tick(&mut self) -> Result<(), TickError> {
        if let Some(mut hook) = self.hook.take() {
            let outcome = hook.act(self);
            if self.hook.is_none() {
                self.hook = Some(hook);
            }
            outcome.map_err(TickError::WorldHook)?;
        }
        for id in self.paint_sequence() {
            let Some(mut hook) = self.take_hook(id) else {
                continue;
            };
            let outcome = hook.act(self, id);
            self.restore_hook(id, hook);
            outcome.map_err(|source| TickError::Actor { id, source })?;
        }
        Ok(())
    }

    pub(crate) fn notify_started(&mut self) {
        if let Some(mut hook) = self.hook.take() {
            hook.started(self);
            if self.hook.is_none() {
                self.hook = Some(hook);
            }
        }
    }

    pub(crate) fn notify_stopped(&mut self) {
        if let Some(mut hook) = self.hook.take() {
            hook.stopped(self);
            if self.hook.is_none() {
                self.hook = Some(hook);
            }
        }
    }

    fn take_hook(&mut self, id: ActorId) -> Option<Box<dyn ActorHook>> {
        self.slot_mut(id)?.hook.take()
    }

    fn restore_hook(&mut self, id: ActorId, hook: Box<dyn ActorHook>) {
        // The actor may have removed itself; its hook is dropped then.
        if let Some(slot) = self.slot_mut(id) {
            if slot.hook.is_none() {
                slot.hook = Some(hook);
            }
        }
    }

    // --- paint order -----------------------------------------------------

    /// Classes listed first paint on top. Actors of unlisted classes
    /// paint first, in insertion order.
    pub fn set_paint_order(&mut self, order: Vec<TypeId>) {
        self.paint_order = order;
        self.mark_redraw();
    }

    /// Actor ids back-to-front. With a paint order set, ranked groups
    /// follow the unlisted actors; the class list is scanned from its
    /// end, so a class listed twice keeps its rearmost rank.
    pub fn paint_sequence(&self) -> Vec<ActorId> {
        if self.paint_order.is_empty() {
            return self.slots.iter().map(|slot| slot.id).collect();
        }
        let mut out: Vec<ActorId> = self
            .slots
            .iter()
            .filter(|slot| !self.paint_order.contains(&slot.hook_type))
            .map(|slot| slot.id)
            .collect();
        let mut seen: Vec<TypeId> = Vec::new();
        for class in self.paint_order.iter().rev() {
            if seen.contains(class) {
                continue;
            }
            seen.push(*class);
            out.extend(
                self.slots
                    .iter()
                    .filter(|slot| slot.hook_type == *class)
                    .map(|slot| slot.id),
            );
        }
        out
    }

    // --- background and text ----------------------------------------------

    pub fn background(&self) -> Sprite {
        self.background.clone()
    }

    pub fn set_background(&mut self, sprite: Sprite) {
        self.background.unwatch(&self.redraw);
        sprite.watch(&self.redraw);
        self.background = sprite;
        self.mark_redraw();
    }

    /// Shows `text` keyed by the exact pixel position; an empty string
    /// removes the entry at that position.
    pub fn show_text(&mut self, text: &str, x: i32, y: i32) {
        if text.is_empty() {
            if self.text_overlays.remove(&(x, y)).is_some() {
                self.mark_redraw();
            }
        } else {
            self.text_overlays.insert((x, y), text.to_string());
            self.mark_redraw();
        }
    }

    /// Overlay entries in a stable order.
    pub fn text_overlays(&self) -> Vec<(i32, i32, String)> {
        let mut entries: Vec<_> = self
            .text_overlays
            .iter()
            .map(|(&(x, y), text)| (x, y, text.clone()))
            .collect();
        entries.sort_by_key(|&(x, y, _)| (y, x));
        entries
    }

    // --- redraw tracking ---------------------------------------------------

    pub(crate) fn mark_redraw(&self) {
        self.redraw.set(true);
    }

    /// Returns and clears the redraw flag. Set by any placement,
    /// rotation, population, overlay, or watched-sprite change.
    pub fn take_redraw(&mut self) -> bool {
        self.redraw.replace(false)
    }

    // --- queries -----------------------------------------------------------

    pub fn objects<T: ActorHook>(&self) -> Vec<ActorId> {
        self.collect_ids(Some(TypeId::of::<T>()), None, |_| true)
    }

    pub fn objects_any(&self) -> Vec<ActorId> {
        self.collect_ids(None, None, |_| true)
    }

    /// Actors whose (slightly inset) bounding rectangle contains the
    /// pixel position.
    pub fn objects_at<T: ActorHook>(&self, x: i32, y: i32) -> Vec<ActorId> {
        self.objects_at_impl(Some(TypeId::of::<T>()), None, x as f64, y as f64)
    }

    pub fn objects_at_any(&self, x: i32, y: i32) -> Vec<ActorId> {
        self.objects_at_impl(None, None, x as f64, y as f64)
    }

    fn objects_at_impl(
        &self,
        filter: Option<TypeId>,
        exclude: Option<ActorId>,
        x: f64,
        y: f64,
    ) -> Vec<ActorId> {
        self.collect_ids(filter, exclude, |actor| {
            actor.bounding_box().inset(QUERY_EDGE_INSET).contains(x, y)
        })
    }

    /// Actors whose bounding rectangle intersects the calling actor's,
    /// the caller's rectangle inset so shared edges do not count.
    pub fn intersecting_objects<T: ActorHook>(&self, me: ActorId) -> Vec<ActorId> {
        self.intersecting_impl(Some(TypeId::of::<T>()), me)
    }

    pub fn intersecting_objects_any(&self, me: ActorId) -> Vec<ActorId> {
        self.intersecting_impl(None, me)
    }

    fn intersecting_impl(&self, filter: Option<TypeId>, me: ActorId) -> Vec<ActorId> {
        let Some(mine) = self.actor(me) else {
            return Vec::new();
        };
        let probe = mine.bounding_box().inset(QUERY_EDGE_INSET);
        self.collect_ids(filter, Some(me), |actor| {
            actor.bounding_box().intersects(&probe)
        })
    }

    pub fn one_intersecting_object<T: ActorHook>(&self, me: ActorId) -> Option<ActorId> {
        self.intersecting_impl(Some(TypeId::of::<T>()), me)
            .into_iter()
            .next()
    }

    pub fn is_touching<T: ActorHook>(&self, me: ActorId) -> bool {
        self.one_intersecting_object::<T>(me).is_some()
    }

    /// Removes the first intersecting actor of type `T`, if any.
    pub fn remove_touching<T: ActorHook>(&mut self, me: ActorId) -> Option<Actor> {
        let id = self.one_intersecting_object::<T>(me)?;
        self.remove_object(id)
    }

    /// Actors intersecting a square probe of side `radius_cells`
    /// cells, centered on the calling actor and rotated with it.
    pub fn objects_in_range<T: ActorHook>(&self, me: ActorId, radius_cells: i32) -> Vec<ActorId> {
        self.objects_in_range_impl(Some(TypeId::of::<T>()), me, radius_cells)
    }

    pub fn objects_in_range_any(&self, me: ActorId, radius_cells: i32) -> Vec<ActorId> {
        self.objects_in_range_impl(None, me, radius_cells)
    }

    fn objects_in_range_impl(
        &self,
        filter: Option<TypeId>,
        me: ActorId,
        radius_cells: i32,
    ) -> Vec<ActorId> {
        let Some(mine) = self.actor(me) else {
            return Vec::new();
        };
        let (x, y) = mine.location();
        let side = (radius_cells * self.cell_size) as f64;
        let probe = BoundingBox::new(x as f64, y as f64, side, side, mine.rotation() as f64);
        self.collect_ids(filter, Some(me), |actor| {
            actor.bounding_box().intersects(&probe)
        })
    }

    /// Point query at a cell offset from the calling actor; the offset
    /// rotates with the caller.
    pub fn objects_at_offset<T: ActorHook>(
        &self,
        me: ActorId,
        dx_cells: i32,
        dy_cells: i32,
    ) -> Vec<ActorId> {
        self.objects_at_offset_impl(Some(TypeId::of::<T>()), me, dx_cells, dy_cells)
    }

    pub fn one_object_at_offset<T: ActorHook>(
        &self,
        me: ActorId,
        dx_cells: i32,
        dy_cells: i32,
    ) -> Option<ActorId> {
        self.objects_at_offset_impl(Some(TypeId::of::<T>()), me, dx_cells, dy_cells)
            .into_iter()
            .next()
    }

    fn objects_at_offset_impl(
        &self,
        filter: Option<TypeId>,
        me: ActorId,
        dx_cells: i32,
        dy_cells: i32,
    ) -> Vec<ActorId> {
        let Some(mine) = self.actor(me) else {
            return Vec::new();
        };
        let (x, y) = mine.bounding_box().offset_point(
            (dx_cells * self.cell_size) as f64,
            (dy_cells * self.cell_size) as f64,
        );
        self.objects_at_impl(filter, Some(me), x, y)
    }

    fn collect_ids(
        &self,
        filter: Option<TypeId>,
        exclude: Option<ActorId>,
        mut pred: impl FnMut(&Actor) -> bool,
    ) -> Vec<ActorId> {
        self.slots
            .iter()
            .filter(|slot| filter.map_or(true, |class| slot.hook_type == class))
            .filter(|slot| exclude.map_or(true, |id| id != slot.id))
            .filter(|slot| pred(&slot.actor))
            .map(|slot| slot.id)
            .collect()
    }

    fn slot(&self, id: ActorId) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.id == id)
    }

    fn slot_mut(&mut self, id: ActorId) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|slot| slot.id == id)
    }
}
