/// Tuning knobs for feedback collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackSettings {
    /// Distinct maps a polymorphic slot may hold before it goes
    /// megamorphic.
    pub max_polymorphic_map_count: usize,
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            max_polymorphic_map_count: 4,
        }
    }
}

impl FeedbackSettings {
    #[inline]
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.max_polymorphic_map_count < 2 {
            return Err("max_polymorphic_map_count must be at least 2");
        }
        if self.max_polymorphic_map_count > 64 {
            return Err("max_polymorphic_map_count must be at most 64");
        }
        Ok(())
    }
}
