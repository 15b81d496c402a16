// record-fuzzing/src/slot.rs
//! Read/replace access to one optional field of an element

/// Handle over an optional field.
///
/// Mutators receive a slot instead of the owning element so the same
/// mutator works for every place a value of its type can appear.
#[derive(Debug)]
pub struct FieldSlot<'a, T> {
    value: &'a mut Option<T>,
}

impl<'a, T> FieldSlot<'a, T> {
    pub fn new(value: &'a mut Option<T>) -> Self {
        Self { value }
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }

    /// Move the current value out, leaving the slot empty
    pub fn take(&mut self) -> Option<T> {
        self.value.take()
    }

    /// Store `value`, returning what was there before
    pub fn replace(&mut self, value: T) -> Option<T> {
        self.value.replace(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_operations() {
        let mut field = Some("a".to_string());
        {
            let mut slot = FieldSlot::new(&mut field);
            assert!(slot.is_present());
            let old = slot.take();
            assert_eq!(old.as_deref(), Some("a"));
            assert!(!slot.is_present());
            assert_eq!(slot.replace("b".to_string()), None);
        }
        assert_eq!(field.as_deref(), Some("b"));
    }
}
