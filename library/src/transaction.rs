//! One undo step per user gesture.

use std::ops::{Deref, DerefMut};

use crate::host::HostGraph;

/// Opens an undo transaction on creation and closes it on drop, on every exit path.
///
/// Helpers take `&mut G` and are called through the guard, so nested helper calls
/// never open transactions of their own.
pub struct UndoScope<'a, G: HostGraph + ?Sized> {
    graph: &'a mut G,
}

impl<'a, G: HostGraph + ?Sized> UndoScope<'a, G> {
    pub fn begin(graph: &'a mut G, text: &str) -> Self {
        graph.begin_undo(text);
        Self { graph }
    }
}

impl<G: HostGraph + ?Sized> Deref for UndoScope<'_, G> {
    type Target = G;

    fn deref(&self) -> &G {
        self.graph
    }
}

impl<G: HostGraph + ?Sized> DerefMut for UndoScope<'_, G> {
    fn deref_mut(&mut self) -> &mut G {
        self.graph
    }
}

impl<G: HostGraph + ?Sized> Drop for UndoScope<'_, G> {
    fn drop(&mut self) {
        self.graph.end_undo();
    }
}
