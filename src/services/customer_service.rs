//! Customer resolution: exact display-name lookup, create on miss.
//!
//! The lookup is authoritative and re-run for every invoice; results are
//! never cached across a batch, so repeat submissions cannot create
//! duplicate customers.

use crate::error::SyncError;
use crate::models::BilledParty;
use crate::qbo::api::QboApi;
use crate::qbo::customer::CreateCustomerRequest;
use crate::qbo::types::{Customer, EmailAddress, PhysicalAddress, TelephoneNumber};
use crate::qbo::QboSession;

pub async fn resolve_or_create<L: QboApi + ?Sized>(
    ledger: &L,
    session: &QboSession,
    party: &BilledParty,
) -> Result<Customer, SyncError> {
    let mut found = ledger.find_customers_by_name(session, &party.name).await?;
    if !found.is_empty() {
        tracing::debug!(customer = %party.name, "customer already exists in QuickBooks");
        return Ok(found.remove(0));
    }

    tracing::info!(customer = %party.name, "creating customer in QuickBooks");

    let request = CreateCustomerRequest {
        display_name: party.name.clone(),
        primary_email_addr: party
            .email
            .clone()
            .map(|address| EmailAddress { address }),
        primary_phone: party
            .mobile_phone
            .clone()
            .map(|free_form_number| TelephoneNumber { free_form_number }),
        bill_addr: party.address.as_ref().map(billing_address),
        given_name: party.first_name.clone().unwrap_or_default(),
        family_name: party.last_name.clone().unwrap_or_default(),
    };

    Ok(ledger.create_customer(session, &request).await?)
}

fn billing_address(address: &crate::models::PostalAddress) -> PhysicalAddress {
    PhysicalAddress {
        line1: address.line1.clone(),
        line2: address.line2.clone(),
        city: address.city.clone(),
        country_sub_division_code: address.state.clone(),
        postal_code: address.zipcode.clone(),
        country: address.country.clone(),
    }
}
