//! Display surface the controller writes to.

use std::{
    collections::{BTreeSet, HashMap},
    sync::{Mutex, MutexGuard},
};

use shared::domain::{
    ElementId, FormData, DEFAULT_CONTAINER_ID, DEFAULT_ERROR_ID, DEFAULT_FORM_ID,
    DEFAULT_LOADING_CLASS, DEFAULT_RESULT_ID,
};

pub trait Page: Send + Sync {
    fn has_element(&self, element: &ElementId) -> bool;
    fn set_text(&self, element: &ElementId, text: &str);
    fn set_class(&self, element: &ElementId, class: &str, enabled: bool);
    /// Current input values of the form, or `None` when it is gone.
    fn read_form(&self, form: &ElementId) -> Option<FormData>;
}

/// A user submission of the form.
#[derive(Debug, Default)]
pub struct SubmitEvent {
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Elements the controller binds to at attach time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayTargets {
    pub form: ElementId,
    pub result: ElementId,
    /// Receives the loading class while a request is in flight.
    pub container: Option<ElementId>,
    /// When set, failures go here instead of the result element.
    pub error: Option<ElementId>,
    pub loading_class: String,
}

impl Default for DisplayTargets {
    fn default() -> Self {
        Self {
            form: ElementId::new(DEFAULT_FORM_ID),
            result: ElementId::new(DEFAULT_RESULT_ID),
            container: Some(ElementId::new(DEFAULT_CONTAINER_ID)),
            error: None,
            loading_class: DEFAULT_LOADING_CLASS.to_string(),
        }
    }
}

impl DisplayTargets {
    pub fn with_error_element(mut self, element: ElementId) -> Self {
        self.error = Some(element);
        self
    }

    pub fn with_default_error_element(self) -> Self {
        self.with_error_element(ElementId::new(DEFAULT_ERROR_ID))
    }

    pub fn without_container(mut self) -> Self {
        self.container = None;
        self
    }

    pub(crate) fn required_elements(&self) -> impl Iterator<Item = &ElementId> {
        [Some(&self.form), Some(&self.result)]
            .into_iter()
            .chain([self.container.as_ref(), self.error.as_ref()])
            .flatten()
    }
}

#[derive(Debug, Default)]
struct Element {
    text: String,
    classes: BTreeSet<String>,
    form: Option<FormData>,
}

/// In-process page: a set of named elements holding text, classes and
/// optional form values.
#[derive(Debug, Default)]
pub struct MemoryPage {
    elements: Mutex<HashMap<ElementId, Element>>,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page with every element `targets` names; the form starts empty.
    pub fn for_targets(targets: &DisplayTargets) -> Self {
        let page = Self::new();
        for element in targets.required_elements() {
            page.add_element(element.clone());
        }
        page.set_form(&targets.form, FormData::new());
        page
    }

    pub fn add_element(&self, element: ElementId) {
        self.lock().entry(element).or_default();
    }

    pub fn remove_element(&self, element: &ElementId) {
        self.lock().remove(element);
    }

    /// Replaces the input values of `form`, creating the element if needed.
    pub fn set_form(&self, form: &ElementId, values: FormData) {
        self.lock().entry(form.clone()).or_default().form = Some(values);
    }

    pub fn text(&self, element: &ElementId) -> Option<String> {
        self.lock().get(element).map(|e| e.text.clone())
    }

    pub fn has_class(&self, element: &ElementId, class: &str) -> bool {
        self.lock()
            .get(element)
            .is_some_and(|e| e.classes.contains(class))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ElementId, Element>> {
        self.elements
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Page for MemoryPage {
    fn has_element(&self, element: &ElementId) -> bool {
        self.lock().contains_key(element)
    }

    fn set_text(&self, element: &ElementId, text: &str) {
        if let Some(e) = self.lock().get_mut(element) {
            e.text = text.to_string();
        }
    }

    fn set_class(&self, element: &ElementId, class: &str, enabled: bool) {
        if let Some(e) = self.lock().get_mut(element) {
            if enabled {
                e.classes.insert(class.to_string());
            } else {
                e.classes.remove(class);
            }
        }
    }

    fn read_form(&self, form: &ElementId) -> Option<FormData> {
        self.lock().get(form).and_then(|e| e.form.clone())
    }
}
