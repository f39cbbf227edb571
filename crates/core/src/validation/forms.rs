//! Schemas and drafts for every form the client submits.

use serde::Serialize;

use super::{
    parse_count, parse_number, Constraint, FieldErrors, FormDraft, Rule, Schema, Validate,
    Validated,
};
use crate::models::{Category, Part};

/// Login form: email shape and a six character password.
pub const LOGIN_SCHEMA: Schema = Schema::new(&[
    Rule::new("email", Constraint::Email, "Invalid email"),
    Rule::new("password", Constraint::MinLength(6), "At least 6 characters"),
]);

/// Account registration form.
pub const REGISTRATION_SCHEMA: Schema = Schema::new(&[
    Rule::new("name", Constraint::MinLength(2), "Name is too short"),
    Rule::new("lastname", Constraint::MinLength(2), "Last name is too short"),
    Rule::new("email", Constraint::Email, "Invalid email"),
    Rule::new("password", Constraint::MinLength(6), "At least 6 characters"),
]);

/// Category form.
pub const CATEGORY_SCHEMA: Schema = Schema::new(&[
    Rule::new("name", Constraint::Required, "Name is required"),
    Rule::new("name", Constraint::MinLength(2), "Name is too short"),
]);

/// Part form.
pub const PART_SCHEMA: Schema = Schema::new(&[
    Rule::new("name", Constraint::Required, "Name is required"),
    Rule::new("name", Constraint::MinLength(2), "Name is too short"),
    Rule::new("categoryId", Constraint::Selection, "Category is required"),
    Rule::new("price", Constraint::Required, "Price is required"),
    Rule::new("price", Constraint::Number, "Price must be a number"),
    Rule::new("price", Constraint::NonNegative, "Price cannot be negative"),
    Rule::new("stock", Constraint::Required, "Stock is required"),
    Rule::new("stock", Constraint::Number, "Stock must be a number"),
    Rule::new("stock", Constraint::Integer, "Stock must be a whole number"),
    Rule::new("stock", Constraint::NonNegative, "Stock cannot be negative"),
    Rule::new("stock", Constraint::AtMost(u32::MAX), "Stock is too large"),
]);

/// Credentials typed into the login form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoginForm {
    /// Account email.
    pub email: String,
    /// Plain password, only ever sent to the login endpoint.
    pub password: String,
}

impl LoginForm {
    /// Build a form from raw values.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl FormDraft for LoginForm {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "email" => Some(&self.email),
            "password" => Some(&self.password),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: String) {
        match name {
            "email" => self.email = value,
            "password" => self.password = value,
            _ => {}
        }
    }
}

impl Validate for LoginForm {
    type Output = LoginForm;

    fn validate(&self) -> Result<Validated<LoginForm>, FieldErrors> {
        LOGIN_SCHEMA.check(self).into_result()?;
        Ok(Validated::new(Self {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        }))
    }
}

/// New-account data; serialises to the register endpoint payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrationForm {
    /// First name.
    pub name: String,
    /// Last name.
    pub lastname: String,
    /// Account email.
    pub email: String,
    /// Chosen password.
    pub password: String,
}

impl FormDraft for RegistrationForm {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "name" => Some(&self.name),
            "lastname" => Some(&self.lastname),
            "email" => Some(&self.email),
            "password" => Some(&self.password),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: String) {
        match name {
            "name" => self.name = value,
            "lastname" => self.lastname = value,
            "email" => self.email = value,
            "password" => self.password = value,
            _ => {}
        }
    }
}

impl Validate for RegistrationForm {
    type Output = RegistrationForm;

    fn validate(&self) -> Result<Validated<RegistrationForm>, FieldErrors> {
        REGISTRATION_SCHEMA.check(self).into_result()?;
        Ok(Validated::new(Self {
            name: self.name.trim().to_string(),
            lastname: self.lastname.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        }))
    }
}

/// Editable category form state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryDraft {
    /// Category name.
    pub name: String,
    /// Free text; empty means no description.
    pub description: String,
}

/// Checked category payload sent on create/update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryInput {
    /// Category name.
    pub name: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&Category> for CategoryDraft {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            description: category.description.clone().unwrap_or_default(),
        }
    }
}

impl FormDraft for CategoryDraft {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "name" => Some(&self.name),
            "description" => Some(&self.description),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: String) {
        match name {
            "name" => self.name = value,
            "description" => self.description = value,
            _ => {}
        }
    }
}

impl Validate for CategoryDraft {
    type Output = CategoryInput;

    fn validate(&self) -> Result<Validated<CategoryInput>, FieldErrors> {
        CATEGORY_SCHEMA.check(self).into_result()?;
        let description = self.description.trim();
        Ok(Validated::new(CategoryInput {
            name: self.name.trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
        }))
    }
}

/// Editable part form state. Numbers are kept as typed text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartDraft {
    /// Part name.
    pub name: String,
    /// Selected category id; empty when nothing is selected.
    pub category_id: String,
    /// Unit price as typed.
    pub price: String,
    /// Units in stock as typed.
    pub stock: String,
}

/// Checked part payload sent on create/update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartInput {
    /// Part name.
    pub name: String,
    /// Owning category.
    #[serde(rename = "categoryId")]
    pub category_id: String,
    /// Unit price.
    pub price: f64,
    /// Units in stock.
    pub stock: u32,
}

impl From<&Part> for PartDraft {
    fn from(part: &Part) -> Self {
        Self {
            name: part.name.clone(),
            category_id: part.category_id.clone(),
            price: part.price.to_string(),
            stock: part.stock.to_string(),
        }
    }
}

impl FormDraft for PartDraft {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "name" => Some(&self.name),
            "categoryId" => Some(&self.category_id),
            "price" => Some(&self.price),
            "stock" => Some(&self.stock),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: String) {
        match name {
            "name" => self.name = value,
            "categoryId" => self.category_id = value,
            "price" => self.price = value,
            "stock" => self.stock = value,
            _ => {}
        }
    }
}

impl Validate for PartDraft {
    type Output = PartInput;

    fn validate(&self) -> Result<Validated<PartInput>, FieldErrors> {
        let errors = PART_SCHEMA.check(self);
        match (
            errors.is_empty(),
            parse_number(&self.price),
            parse_count(&self.stock),
        ) {
            (true, Some(price), Some(stock)) => Ok(Validated::new(PartInput {
                name: self.name.trim().to_string(),
                category_id: self.category_id.trim().to_string(),
                price,
                stock,
            })),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part_draft(name: &str, category: &str, price: &str, stock: &str) -> PartDraft {
        PartDraft {
            name: name.to_string(),
            category_id: category.to_string(),
            price: price.to_string(),
            stock: stock.to_string(),
        }
    }

    #[test]
    fn negative_price_is_reported_on_price_only() {
        let errors = part_draft("Filter", "cat1", "-5", "2")
            .validate()
            .expect_err("negative price must be rejected");
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["price"]);
        assert_eq!(errors.get("price"), Some("Price cannot be negative"));
    }

    #[test]
    fn every_violated_field_is_reported_with_its_first_message() {
        let errors = part_draft("", "", "abc", "1.5")
            .validate()
            .expect_err("draft is invalid");
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["name", "categoryId", "price", "stock"]
        );
        assert_eq!(errors.get("name"), Some("Name is required"));
        assert_eq!(errors.get("price"), Some("Price must be a number"));
        assert_eq!(errors.get("stock"), Some("Stock must be a whole number"));
    }

    #[test]
    fn stock_beyond_u32_is_rejected_not_clamped() {
        let errors = part_draft("Filter", "cat1", "10", "5000000000")
            .validate()
            .expect_err("stock overflows");
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["stock"]);
        assert_eq!(errors.get("stock"), Some("Stock is too large"));

        let input = part_draft("Filter", "cat1", "10", "4294967295")
            .validate()
            .expect("largest stock fits")
            .into_inner();
        assert_eq!(input.stock, u32::MAX);
    }

    #[test]
    fn valid_part_draft_is_coerced() {
        let input = part_draft(" Filter ", "cat1", "12.5", "3")
            .validate()
            .expect("draft is valid")
            .into_inner();
        assert_eq!(input.name, "Filter");
        assert_eq!(input.price, 12.5);
        assert_eq!(input.stock, 3);
    }

    #[test]
    fn empty_category_description_is_omitted() {
        let draft = CategoryDraft {
            name: "Oils".to_string(),
            description: "  ".to_string(),
        };
        let input = draft.validate().expect("draft is valid");
        assert_eq!(input.description, None);
        assert_eq!(
            serde_json::to_value(input.get()).expect("serialises"),
            serde_json::json!({ "name": "Oils" })
        );
    }

    #[test]
    fn short_category_name_is_rejected() {
        let draft = CategoryDraft {
            name: "A".to_string(),
            description: String::new(),
        };
        let errors = draft.validate().expect_err("name too short");
        assert_eq!(errors.get("name"), Some("Name is too short"));
    }

    #[test]
    fn login_and_registration_schemas() {
        let errors = LoginForm::new("not-an-email", "123")
            .validate()
            .expect_err("invalid login");
        assert_eq!(errors.len(), 2);

        let form = RegistrationForm {
            name: "Ana".to_string(),
            lastname: "G".to_string(),
            email: "ana@example.com".to_string(),
            password: "secret1".to_string(),
        };
        let errors = form.validate().expect_err("lastname too short");
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["lastname"]);
    }

    #[test]
    fn draft_round_trips_from_record() {
        let part = Part {
            id: "p1".to_string(),
            name: "Filter".to_string(),
            category_id: "cat1".to_string(),
            price: 10.0,
            stock: 4,
        };
        let mut draft = PartDraft::from(&part);
        assert_eq!(draft.price, "10");
        draft.set_field("stock", "5".to_string());
        assert_eq!(draft.field("stock"), Some("5"));
        assert_eq!(draft.field("unknown"), None);
    }
}
