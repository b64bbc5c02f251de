use calmform::form::{FormValues, Value, Values};

#[derive(Clone, calmform::form::FormValues)]
struct DemoForm {
    email: String,
    age: Option<i64>,
    tags: Vec<String>,
}

fn main() {
    let fields = DemoForm::fields();
    assert_eq!(fields.email().as_str(), "email");
    assert_eq!(DemoForm::field_keys(), &["email", "age", "tags"]);

    let model = DemoForm {
        email: "a@calm.ui".to_string(),
        age: None,
        tags: vec!["x".to_string()],
    };
    let values: Values = model.to_values();
    assert_eq!(values.get("email"), Some(&Value::from("a@calm.ui")));
    assert_eq!(values.get("age"), Some(&Value::Undefined));

    let restored = DemoForm::from_values(&values).expect("values convert back");
    assert_eq!(restored.email, "a@calm.ui");
    assert_eq!(restored.tags, vec!["x".to_string()]);
}
