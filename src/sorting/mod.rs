//! Fruit sorting mini-game
//!
//! Six gummies per round go into bowls of matching color, either by dragging
//! or by clicking a fruit and then a bowl. A dragged fruit lands in a bowl
//! when their hit circles overlap; a wrong bowl (or no bowl) sends it home.

pub mod fruit;

pub use fruit::{BowlColor, Fruit};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::Rect;

/// Fruits per round, laid out on a grid
pub const ROUND_COLUMNS: usize = 3;
pub const ROUND_ROWS: usize = 2;

/// Viewports this narrow use the compact layout
pub const COMPACT_MAX_WIDTH: f64 = 700.0;

pub fn is_compact_viewport(width: f64) -> bool {
    width <= COMPACT_MAX_WIDTH
}

/// Hit circle used for drop matching: centered, radius a quarter of the height
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn from_rect(rect: &Rect) -> Self {
        Self {
            center: rect.center(),
            radius: rect.size.y / 4.0,
        }
    }

    pub fn overlaps(&self, other: &Circle) -> bool {
        self.center.distance(other.center) < self.radius + other.radius
    }
}

pub type FruitId = u32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FruitPiece {
    pub id: FruitId,
    pub fruit: Fruit,
    /// Where the fruit rests on the board
    pub home: Rect,
    /// Hidden while a drag ghost stands in for it
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bowl {
    pub color: BowlColor,
    pub rect: Rect,
}

/// An in-progress drag: the ghost keeps the grab offset under the pointer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub fruit: FruitId,
    pub grab_offset: Vec2,
    pub ghost: Rect,
}

/// Outcome of trying to put a fruit in a bowl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Right bowl; the fruit leaves the board
    Accepted {
        fruit: FruitId,
        bowl: usize,
        /// That was the last fruit of the round
        round_complete: bool,
    },
    /// Wrong bowl or no bowl; the fruit goes back home
    Rejected { fruit: FruitId, bowl: Option<usize> },
}

#[derive(Debug, Default)]
pub struct SortingBoard {
    bowls: Vec<Bowl>,
    fruits: Vec<FruitPiece>,
    selected: Option<FruitId>,
    drag: Option<DragSession>,
    next_id: FruitId,
    /// Rounds cleared so far
    pub rounds_completed: u32,
}

impl SortingBoard {
    pub fn new(bowls: Vec<Bowl>) -> Self {
        Self {
            bowls,
            ..Default::default()
        }
    }

    /// Replace whatever is on the board with a fresh round of random fruit.
    /// `container` is the fruit area size; fruits are `fruit_size` squares
    /// centered in each grid cell.
    pub fn spawn_round(
        &mut self,
        container: Vec2,
        fruit_size: f32,
        compact: bool,
        rng: &mut impl Rng,
    ) -> &[FruitPiece] {
        self.fruits.clear();
        self.selected = None;
        self.drag = None;

        let spacing = Vec2::new(
            container.x / ROUND_COLUMNS as f32,
            container.y / ROUND_ROWS as f32,
        );
        // Down a little on desktop; up and slightly left on compact screens
        let nudge = if compact {
            Vec2::new(-0.05 * container.x, -15.0)
        } else {
            Vec2::new(0.0, 20.0)
        };

        for i in 0..ROUND_COLUMNS * ROUND_ROWS {
            let fruit = Fruit::ALL[rng.random_range(0..Fruit::ALL.len())];
            let cell = Vec2::new((i % ROUND_COLUMNS) as f32, (i / ROUND_COLUMNS) as f32);
            let center = cell * spacing + spacing / 2.0 + nudge;
            let id = self.next_id;
            self.next_id += 1;
            self.fruits.push(FruitPiece {
                id,
                fruit,
                home: Rect {
                    pos: center - Vec2::splat(fruit_size / 2.0),
                    size: Vec2::splat(fruit_size),
                },
                visible: true,
            });
        }

        log::debug!("Spawned sorting round with {} fruits", self.fruits.len());
        &self.fruits
    }

    /// Click-to-sort: clicking a fruit selects it, clicking it again deselects
    pub fn click_fruit(&mut self, id: FruitId) -> Option<FruitId> {
        if self.piece(id).is_none() {
            return self.selected;
        }
        self.selected = if self.selected == Some(id) { None } else { Some(id) };
        self.selected
    }

    /// Click-to-sort: put the selected fruit straight into bowl `index`
    pub fn click_bowl(&mut self, index: usize) -> Option<Placement> {
        if index >= self.bowls.len() {
            return None;
        }
        let fruit = self.selected.take()?;
        Some(self.place(fruit, Some(index)))
    }

    /// Pick up a fruit; it stays hidden while its ghost follows the pointer
    pub fn start_drag(&mut self, id: FruitId, pointer: Vec2) -> bool {
        self.selected = None;
        let Some(piece) = self.fruits.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        piece.visible = false;
        self.drag = Some(DragSession {
            fruit: id,
            grab_offset: pointer - piece.home.pos,
            ghost: piece.home,
        });
        true
    }

    pub fn drag_to(&mut self, pointer: Vec2) -> Option<Rect> {
        let drag = self.drag.as_mut()?;
        drag.ghost.pos = pointer - drag.grab_offset;
        Some(drag.ghost)
    }

    /// Drop the ghost; the last bowl it overlaps is the target
    pub fn end_drag(&mut self) -> Option<Placement> {
        let drag = self.drag.take()?;
        let ghost = Circle::from_rect(&drag.ghost);
        let target = self
            .bowls
            .iter()
            .enumerate()
            .filter(|(_, bowl)| ghost.overlaps(&Circle::from_rect(&bowl.rect)))
            .map(|(i, _)| i)
            .last();
        Some(self.place(drag.fruit, target))
    }

    fn place(&mut self, id: FruitId, bowl: Option<usize>) -> Placement {
        let Some(index) = self.fruits.iter().position(|p| p.id == id) else {
            return Placement::Rejected { fruit: id, bowl };
        };

        let matched = bowl
            .and_then(|b| self.bowls.get(b))
            .is_some_and(|b| b.color == self.fruits[index].fruit.color());

        match bowl {
            Some(b) if matched => {
                self.fruits.remove(index);
                let round_complete = self.fruits.is_empty();
                if round_complete {
                    self.rounds_completed += 1;
                    log::info!("Sorting round {} complete", self.rounds_completed);
                }
                Placement::Accepted {
                    fruit: id,
                    bowl: b,
                    round_complete,
                }
            }
            _ => {
                self.fruits[index].visible = true;
                Placement::Rejected { fruit: id, bowl }
            }
        }
    }

    /// Bowls move with the page layout; hosts refresh them before a drop
    pub fn set_bowl_rect(&mut self, index: usize, rect: Rect) -> bool {
        match self.bowls.get_mut(index) {
            Some(bowl) => {
                bowl.rect = rect;
                true
            }
            None => false,
        }
    }

    pub fn piece(&self, id: FruitId) -> Option<&FruitPiece> {
        self.fruits.iter().find(|p| p.id == id)
    }

    pub fn fruits(&self) -> &[FruitPiece] {
        &self.fruits
    }

    pub fn bowls(&self) -> &[Bowl] {
        &self.bowls
    }

    pub fn selected(&self) -> Option<FruitId> {
        self.selected
    }

    pub fn drag(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }
}
