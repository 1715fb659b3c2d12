//! Level objects, the exchanged level value, and the live object store
//!
//! `Level` is the value the editor and persistence layers read and write.
//! `LevelStore` is the running copy: an arena addressed by [`ObjectId`] that
//! carries the one-shot `used` flags and the group mutations applied by
//! triggers. It does not own a spatial index; callers rebuild one with
//! [`LevelStore::spatial_index`] after any structural or positional change.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::quadtree::QuadTree;
use super::rect::Rect;
use crate::error::LevelError;

/// Group tag shared by objects that triggers mutate together
pub type GroupId = u32;

/// Stable handle into a [`LevelStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl ObjectId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a portal changes on contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortalEffect {
    Mode,
    Gravity,
    Mini,
    Mirror,
    Dual,
    Speed,
    #[serde(other)]
    Unknown,
}

/// Portal payload value: a mode name or a speed multiplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortalValue {
    Number(f32),
    Name(String),
}

impl PortalValue {
    pub fn as_number(&self) -> Option<f32> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Name(s) => s.parse().ok(),
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(s) => Some(s),
            Self::Number(_) => None,
        }
    }
}

/// Orb variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrbEffect {
    Yellow,
    Green,
    Red,
    Dash,
    #[serde(other)]
    Unknown,
}

impl OrbEffect {
    /// Jump impulse multiplier. Dash is 0: it holds instead of launching.
    pub fn factor(self) -> Option<f32> {
        match self {
            OrbEffect::Yellow => Some(1.0),
            OrbEffect::Green => Some(1.2),
            OrbEffect::Red => Some(0.8),
            OrbEffect::Dash => Some(0.0),
            OrbEffect::Unknown => None,
        }
    }
}

/// What a trigger does to its target group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEffect {
    Move,
    Color,
    Alpha,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dx: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dy: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f32>,
}

/// Object kind with its kind-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ObjectKind {
    Block,
    Spike,
    Portal {
        effect: PortalEffect,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<PortalValue>,
    },
    Orb {
        effect: OrbEffect,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<u32>,
    },
    Pad,
    Coin {
        #[serde(default)]
        id: u32,
    },
    Tele {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_x: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_y: Option<f32>,
    },
    Trigger {
        effect: TriggerEffect,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_group: Option<GroupId>,
        #[serde(default)]
        params: TriggerParams,
    },
    Finish,
    #[serde(other)]
    Unknown,
}

impl ObjectKind {
    /// Blocks stop the actor
    pub fn is_solid(&self) -> bool {
        matches!(self, ObjectKind::Block)
    }

    /// Kinds with a one-shot contact effect
    pub fn is_interactive(&self) -> bool {
        !matches!(self, ObjectKind::Block | ObjectKind::Unknown)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ObjectKind::Block => "block",
            ObjectKind::Spike => "spike",
            ObjectKind::Portal { .. } => "portal",
            ObjectKind::Orb { .. } => "orb",
            ObjectKind::Pad => "pad",
            ObjectKind::Coin { .. } => "coin",
            ObjectKind::Tele { .. } => "tele",
            ObjectKind::Trigger { .. } => "trigger",
            ObjectKind::Finish => "finish",
            ObjectKind::Unknown => "unknown",
        }
    }
}

/// A placed level object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelObject {
    #[serde(flatten)]
    pub rect: Rect,
    #[serde(flatten)]
    pub kind: ObjectKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f32>,
    /// One-shot flag; only a level reset clears it
    #[serde(skip)]
    pub used: bool,
}

impl LevelObject {
    pub fn new(kind: ObjectKind, rect: Rect) -> Self {
        Self {
            rect,
            kind,
            group: None,
            rotation: None,
            color: None,
            alpha: None,
            used: false,
        }
    }

    pub fn with_group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }

    pub fn block(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self::new(ObjectKind::Block, Rect::new(x, y, w, h))
    }

    pub fn spike(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self::new(ObjectKind::Spike, Rect::new(x, y, w, h))
    }
}

/// Level value exchanged with the editor and save system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub objects: Vec<LevelObject>,
    pub width: f32,
    pub height: f32,
}

impl Level {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            objects: Vec::new(),
            width,
            height,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Check the level size and that every object lies inside the bounds
    pub fn validate(&self) -> Result<(), LevelError> {
        if !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0) {
            return Err(LevelError::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }
        let bounds = self.bounds();
        if let Some((index, obj)) = self
            .objects
            .iter()
            .enumerate()
            .find(|(_, o)| !bounds.contains(&o.rect))
        {
            return Err(LevelError::OutOfBounds {
                index,
                x: obj.rect.x,
                y: obj.rect.y,
            });
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let level: Level = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    pub fn to_json(&self) -> Result<String, LevelError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let level = Self::from_json(&json)?;
        log::info!(
            "Loaded level {} ({} objects, {}x{})",
            path.as_ref().display(),
            level.objects.len(),
            level.width,
            level.height
        );
        Ok(level)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LevelError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Bulk edit applied to every object in a group
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GroupMutation {
    Translate { dx: f32, dy: f32 },
    Color(u8),
    Alpha(f32),
}

impl GroupMutation {
    pub fn apply(&self, obj: &mut LevelObject) {
        match *self {
            GroupMutation::Translate { dx, dy } => obj.rect = obj.rect.translated(dx, dy),
            GroupMutation::Color(color) => obj.color = Some(color),
            GroupMutation::Alpha(alpha) => obj.alpha = Some(alpha.clamp(0.0, 1.0)),
        }
    }

    /// Moves objects, so any spatial index over them is stale afterwards
    pub fn is_positional(&self) -> bool {
        matches!(self, GroupMutation::Translate { .. })
    }
}

/// Running copy of a level
#[derive(Debug, Clone)]
pub struct LevelStore {
    /// Removed objects leave a tombstone so handles stay stable
    slots: Vec<Option<LevelObject>>,
    /// Objects as loaded, restored by `reset`
    pristine: Vec<LevelObject>,
    width: f32,
    height: f32,
}

impl LevelStore {
    pub fn from_level(level: Level) -> Self {
        let mut pristine = level.objects;
        for obj in &mut pristine {
            obj.used = false;
        }
        Self {
            slots: pristine.iter().cloned().map(Some).collect(),
            pristine,
            width: level.width,
            height: level.height,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    pub fn get(&self, id: ObjectId) -> Option<&LevelObject> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut LevelObject> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Live objects in handle order
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &LevelObject)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|obj| (ObjectId(i as u32), obj)))
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add an object to the running level. Rebuild the index afterwards.
    pub fn insert(&mut self, obj: LevelObject) -> ObjectId {
        self.slots.push(Some(obj));
        ObjectId((self.slots.len() - 1) as u32)
    }

    /// Remove an object from the running level. Rebuild the index afterwards.
    pub fn remove(&mut self, id: ObjectId) -> Option<LevelObject> {
        self.slots.get_mut(id.index()).and_then(Option::take)
    }

    /// Run `f` over every live object tagged with `group`; returns the count
    pub fn for_each_in_group(&mut self, group: GroupId, mut f: impl FnMut(&mut LevelObject)) -> usize {
        let mut count = 0;
        for obj in self.slots.iter_mut().flatten() {
            if obj.group == Some(group) {
                f(obj);
                count += 1;
            }
        }
        count
    }

    /// Apply a bulk mutation to a group. Positional mutations leave any
    /// spatial index stale until the caller rebuilds it.
    pub fn apply_to_group(&mut self, group: GroupId, mutation: GroupMutation) -> usize {
        self.for_each_in_group(group, |obj| mutation.apply(obj))
    }

    /// Restore the load-time objects: clears `used` and undoes group mutations
    pub fn reset(&mut self) {
        self.slots = self.pristine.iter().cloned().map(Some).collect();
    }

    pub fn has_finish(&self) -> bool {
        self.iter().any(|(_, o)| matches!(o.kind, ObjectKind::Finish))
    }

    /// Export the live objects as a level value
    pub fn to_level(&self) -> Level {
        Level {
            objects: self
                .iter()
                .map(|(_, o)| LevelObject { used: false, ..o.clone() })
                .collect(),
            width: self.width,
            height: self.height,
        }
    }

    /// Build a fresh spatial index snapshot over the live objects
    pub fn spatial_index(&self, capacity: usize) -> QuadTree<ObjectId> {
        QuadTree::build(self.bounds(), capacity, self.iter().map(|(id, obj)| (obj.rect, id)))
    }
}
