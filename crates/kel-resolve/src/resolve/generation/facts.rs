//! Type-narrowing fact stack.
//!
//! A frame is pushed when entering a branch where a condition is known to
//! hold (the right side of `and`, the `then` branch of `if`) and popped on
//! exit. Lookups search the innermost frame first.

use kel_ast::{Type, TypeFacts};

#[derive(Debug, Default)]
pub(super) struct FactStack {
    frames: Vec<TypeFacts>,
}

impl FactStack {
    pub(super) fn push(&mut self, facts: Option<&TypeFacts>) {
        self.frames.push(facts.cloned().unwrap_or_default());
    }

    pub(super) fn pop(&mut self) {
        self.frames.pop();
    }

    pub(super) fn lookup(&self, key: &str) -> Option<&Type> {
        self.frames.iter().rev().find_map(|frame| frame.get(key))
    }

    /// Detach all frames; used where `this` changes meaning.
    pub(super) fn isolate(&mut self) -> Vec<TypeFacts> {
        std::mem::take(&mut self.frames)
    }

    pub(super) fn restore(&mut self, frames: Vec<TypeFacts>) {
        self.frames = frames;
    }
}

/// Facts holding when both sides hold; the right side wins on conflict.
pub(super) fn conjoin(left: Option<&TypeFacts>, right: Option<&TypeFacts>) -> TypeFacts {
    let mut facts = left.cloned().unwrap_or_default();
    if let Some(right) = right {
        facts.extend(right.iter().map(|(key, ty)| (key.clone(), ty.clone())));
    }
    facts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_innermost_frame_wins() {
        let mut stack = FactStack::default();
        stack.push(Some(&TypeFacts::from([("this".to_string(), Type::number())])));
        stack.push(Some(&TypeFacts::from([("this".to_string(), Type::money())])));
        assert_eq!(stack.lookup("this"), Some(&Type::money()));

        stack.pop();
        assert_eq!(stack.lookup("this"), Some(&Type::number()));

        let saved = stack.isolate();
        assert_eq!(stack.lookup("this"), None);
        stack.restore(saved);
        assert!(stack.lookup("this").is_some());
    }
}
