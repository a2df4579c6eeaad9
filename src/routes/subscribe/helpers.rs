use super::super::helpers::prepare_html_template;

pub const PRODUCT_NAME: &str = "LeftNotOver";

pub fn get_welcome_email_subject() -> String {
    format!("Thanks for joining {PRODUCT_NAME}")
}

pub fn get_welcome_email_html() -> String {
    prepare_html_template(&[("product", PRODUCT_NAME)], "welcome_letter.html")
}
