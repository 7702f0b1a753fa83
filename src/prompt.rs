//! Interactive collection of the QR payload.
//!
//! Asks for either a URL or a contact card. Contact answers are kept in a
//! [`ContactForm`] so the conversion to vCard text stays testable without a
//! terminal.
use std::io::ErrorKind;

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};

use crate::error::{Error, Result};
use crate::vcard::{Address, VCard};

/// What the user asked to encode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    Url(String),
    Contact(ContactForm),
}

impl Payload {
    /// The text that goes into the QR code.
    pub fn into_data(self) -> String {
        match self {
            Payload::Url(url) => url,
            Payload::Contact(form) => form.to_vcard().to_string(),
        }
    }
}

/// Answers to the contact prompts. Empty answers are `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub surname: String,
    pub email: Option<String>,
    pub work_phone: Option<String>,
    pub home_phone: Option<String>,
    pub organization: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub note: Option<String>,
    pub work_address: Option<Address>,
    pub home_address: Option<Address>,
}

impl ContactForm {
    pub fn to_vcard(&self) -> VCard {
        let mut card = VCard::new(&self.name, &self.surname);
        if let Some(organization) = &self.organization {
            card.add_organization(organization);
        }
        if let Some(title) = &self.title {
            card.add_title(title);
        }
        if let Some(address) = &self.work_address {
            card.add_work_address(address);
        }
        if let Some(address) = &self.home_address {
            card.add_home_address(address);
        }
        if let Some(phone) = &self.work_phone {
            card.add_work_phone(phone);
        }
        if let Some(phone) = &self.home_phone {
            card.add_home_phone(phone);
        }
        if let Some(email) = &self.email {
            card.add_email(email);
        }
        if let Some(url) = &self.url {
            card.add_url(url);
        }
        if let Some(note) = &self.note {
            card.add_note(note);
        }
        card
    }
}

/// Runs the prompt sequence on the terminal.
///
/// # Errors
///
/// [`Error::InputAborted`] when the user escapes a selection or input ends.
pub fn prompt_payload() -> Result<Payload> {
    let theme = ColorfulTheme::default();
    let choice = Select::with_theme(&theme)
        .with_prompt("What should the QR code contain?")
        .items(&["URL", "Contact (vCard)"])
        .default(0)
        .interact_opt()
        .map_err(prompt_error)?
        .ok_or(Error::InputAborted)?;

    match choice {
        0 => Ok(Payload::Url(ask(&theme, "URL")?)),
        _ => Ok(Payload::Contact(prompt_contact(&theme)?)),
    }
}

fn prompt_contact(theme: &ColorfulTheme) -> Result<ContactForm> {
    let mut form = ContactForm {
        name: ask(theme, "Name")?,
        surname: ask(theme, "Surname")?,
        ..ContactForm::default()
    };
    form.email = ask_optional(theme, "Email")?;
    form.work_phone = ask_optional(theme, "Work phone")?;
    form.home_phone = ask_optional(theme, "Home phone")?;
    form.organization = ask_optional(theme, "Organization")?;
    form.title = ask_optional(theme, "Title")?;
    form.url = ask_optional(theme, "Website")?;
    form.note = ask_optional(theme, "Note")?;
    if confirm(theme, "Add a work address?")? {
        form.work_address = Some(prompt_address(theme)?);
    }
    if confirm(theme, "Add a home address?")? {
        form.home_address = Some(prompt_address(theme)?);
    }
    Ok(form)
}

fn prompt_address(theme: &ColorfulTheme) -> Result<Address> {
    Ok(Address {
        street: ask(theme, "  Street")?,
        city: ask(theme, "  City")?,
        state: ask_optional(theme, "  State")?.unwrap_or_default(),
        zip_code: ask(theme, "  Zip code")?,
        country: ask(theme, "  Country")?,
    })
}

fn ask(theme: &ColorfulTheme, prompt: &str) -> Result<String> {
    let answer: String = Input::with_theme(theme)
        .with_prompt(prompt)
        .interact_text()
        .map_err(prompt_error)?;
    Ok(answer.trim().to_string())
}

fn ask_optional(theme: &ColorfulTheme, prompt: &str) -> Result<Option<String>> {
    let answer: String = Input::with_theme(theme)
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_error)?;
    Ok(non_empty(&answer))
}

fn confirm(theme: &ColorfulTheme, prompt: &str) -> Result<bool> {
    Confirm::with_theme(theme)
        .with_prompt(prompt)
        .default(false)
        .interact_opt()
        .map_err(prompt_error)?
        .ok_or(Error::InputAborted)
}

fn non_empty(answer: &str) -> Option<String> {
    let trimmed = answer.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn prompt_error(err: dialoguer::Error) -> Error {
    #[allow(unreachable_patterns)]
    match err {
        dialoguer::Error::IO(io) => match io.kind() {
            ErrorKind::Interrupted | ErrorKind::UnexpectedEof => Error::InputAborted,
            _ => Error::Io(io),
        },
        _ => Error::InputAborted,
    }
}
