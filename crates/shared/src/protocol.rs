use serde::{Deserialize, Serialize};

use crate::domain::{Address, Contact, ContactId};

/// One page of the remote collection endpoint. The paging metadata is
/// decoded but not acted upon; this client only ever requests the first
/// page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactPage {
    pub users: Vec<Contact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// Creation/update payload: a contact without a server-assigned identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: Address,
}

/// Partial contact as returned by the update endpoint: only the fields the
/// server chose to echo back. Fields absent from the response must not
/// clobber the local copy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPatch {
    #[serde(default)]
    pub id: Option<ContactId>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub image: Option<String>,
}

impl ContactPatch {
    /// Merge the returned fields into an existing record. Present fields
    /// take precedence, absent fields keep their prior value, and the
    /// local id is never rewritten.
    pub fn apply_to(self, contact: &mut Contact) {
        if let Some(first_name) = self.first_name {
            contact.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            contact.last_name = last_name;
        }
        if let Some(email) = self.email {
            contact.email = email;
        }
        if let Some(phone) = self.phone {
            contact.phone = phone;
        }
        if let Some(address) = self.address {
            contact.address = address;
        }
        if let Some(image) = self.image {
            contact.image = Some(image);
        }
    }
}
