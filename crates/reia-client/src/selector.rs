use tracing::{info, warn};

/// Picks which remote model to use from a static preference list and the set
/// of models the service reports as available.
///
/// The cursor advanced by [`ModelSelector::switch_to_next`] belongs to this
/// instance and is never reset.
#[derive(Debug, Clone)]
pub struct ModelSelector {
    preferred: Vec<String>,
    available: Vec<String>,
    cursor: usize,
}

impl ModelSelector {
    pub fn new(preferred: Vec<String>, available: Vec<String>) -> Self {
        Self {
            preferred,
            available,
            cursor: 0,
        }
    }

    pub fn preferred(&self) -> &[String] {
        &self.preferred
    }

    pub fn available(&self) -> &[String] {
        &self.available
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn is_available(&self, model: &str) -> bool {
        self.available.iter().any(|m| m == model)
    }

    /// First preferred model that is available, else the first available
    /// model, else `None`.
    pub fn select_best(&self) -> Option<String> {
        if let Some(model) = self.preferred.iter().find(|m| self.is_available(m)) {
            info!(model = %model, "Selected preferred model");
            return Some(model.clone());
        }

        let fallback = self.available.first().cloned();
        match &fallback {
            Some(model) => warn!(model = %model, "No preferred model available, using fallback"),
            None => warn!("No models available"),
        }
        fallback
    }

    /// Advance through the preference list to the next available entry. Past
    /// the end of the list, fall back to the first available model outside the
    /// preference list, then to the first available model of any kind.
    pub fn switch_to_next(&mut self) -> Option<String> {
        while self.cursor + 1 < self.preferred.len() {
            self.cursor += 1;
            let candidate = &self.preferred[self.cursor];
            if self.is_available(candidate) {
                info!(
                    model = %candidate,
                    position = self.cursor + 1,
                    of = self.preferred.len(),
                    "Switching to next preferred model"
                );
                return Some(candidate.clone());
            }
        }
        self.cursor = self.preferred.len();

        if let Some(model) = self
            .available
            .iter()
            .find(|m| !self.preferred.contains(m))
        {
            warn!(model = %model, "Preference list exhausted, using non-preferred model");
            return Some(model.clone());
        }

        if let Some(model) = self.available.first() {
            warn!(model = %model, "Preference list exhausted, reusing first available model");
            return Some(model.clone());
        }

        warn!("No more models available for fallback");
        None
    }
}
