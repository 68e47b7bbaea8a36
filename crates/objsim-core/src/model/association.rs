/// One end of an association
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationEnd {
    pub role: String,
    pub class: String,
}

/// An association between classes; links are ordered by end
#[derive(Debug, Clone, PartialEq)]
pub struct Association {
    pub name: String,
    pub ends: Vec<AssociationEnd>,
}

impl Association {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ends: Vec::new(),
        }
    }

    pub fn with_end(mut self, role: impl Into<String>, class: impl Into<String>) -> Self {
        self.ends.push(AssociationEnd {
            role: role.into(),
            class: class.into(),
        });
        self
    }

    pub fn arity(&self) -> usize {
        self.ends.len()
    }
}
