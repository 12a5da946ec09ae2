use std::collections::HashMap;

/// Maps every attached sub-frame straight to its top-level ancestor.
///
/// Ancestry is resolved when a frame is attached, so a lookup is a single
/// map probe. Entries are never removed.
#[derive(Debug, Default)]
pub struct FrameTree {
    roots: HashMap<String, String>,
}

impl FrameTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `frame_id` lives inside `parent_id`
    pub fn attach(&mut self, frame_id: &str, parent_id: &str) {
        let mut root = parent_id;
        let mut hops = 0;
        while let Some(next) = self.roots.get(root) {
            if next == frame_id || hops > self.roots.len() {
                tracing::debug!("Frame ancestry loop at {}, stopping at {}", frame_id, root);
                break;
            }
            root = next.as_str();
            hops += 1;
        }

        let root = root.to_string();
        tracing::debug!("Frame {} attached under root {}", frame_id, root);
        self.roots.insert(frame_id.to_string(), root);
    }

    /// Top-level frame owning `frame_id`; a frame never attached is its own root
    pub fn root_of<'a>(&'a self, frame_id: &'a str) -> &'a str {
        self.roots
            .get(frame_id)
            .map(String::as_str)
            .unwrap_or(frame_id)
    }

    /// Whether the frame was ever attached to a parent
    pub fn is_subframe(&self, frame_id: &str) -> bool {
        self.roots.contains_key(frame_id)
    }
}
