//! Block types and their properties.
//! Properties are queried via methods, not stored as flags,
//! so block semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Block {
    #[default]
    Solid, // Undug earth
    Empty, // Tunnel
    Rock,  // Heavy; falls when the cell below is empty
}

impl Block {
    /// Blocks the player and falling rocks.
    pub fn is_solid(self) -> bool {
        matches!(self, Block::Solid | Block::Rock)
    }

    pub fn is_empty(self) -> bool {
        matches!(self, Block::Empty)
    }

    pub fn is_rock(self) -> bool {
        matches!(self, Block::Rock)
    }

    /// Can the player dig into this block by walking at it?
    pub fn is_diggable(self) -> bool {
        matches!(self, Block::Solid)
    }
}
