use crate::tracker::domain::{AccountProfile, SaleRecord};
use crate::tracker::products::MaterialScope;
use crate::tracker::spec::SchemeSpec;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Produces the definitive, sorted list of participating credit accounts.
///
/// The configured account list wins when present; otherwise every account
/// seen in sales participates. Accounts without sales inside the main
/// scheme's material set are gated by the state whitelist: when states are
/// declared, an account qualifies only if a sales record reveals a
/// whitelisted state, and accounts with no sales at all are dropped rather
/// than emitted as `Unknown` rows.
pub fn resolve_accounts(sales: &[SaleRecord], scheme: &SchemeSpec) -> Vec<AccountProfile> {
    let scope = MaterialScope::for_main_scheme(&scheme.product_data);

    let configured: BTreeSet<String> = if scheme.selected_credit_accounts.is_empty() {
        sales.iter().map(|sale| sale.account.clone()).collect()
    } else {
        scheme.selected_credit_accounts.clone()
    };

    // Descriptive columns come from any sale of the account, product-scoped
    // or not.
    let mut first_sale: HashMap<&str, &SaleRecord> = HashMap::new();
    let mut with_product_sales: HashSet<&str> = HashSet::new();
    for sale in sales {
        first_sale.entry(sale.account.as_str()).or_insert(sale);
        if scope.matches(&sale.material) {
            with_product_sales.insert(sale.account.as_str());
        }
    }

    let mut accounts = Vec::with_capacity(configured.len());
    for account in &configured {
        let profile = first_sale.get(account.as_str()).map(|sale| {
            let mut profile = AccountProfile::from_sale(sale);
            profile.account = account.clone();
            profile
        });

        if with_product_sales.contains(account.as_str()) {
            accounts.push(profile.unwrap_or_else(|| AccountProfile::unknown(account.clone())));
            continue;
        }

        if scheme.selected_states.is_empty() {
            accounts.push(profile.unwrap_or_else(|| AccountProfile::unknown(account.clone())));
        } else if let Some(profile) = profile {
            if scheme.selected_states.contains(&profile.state) {
                accounts.push(profile);
            }
        }
    }

    accounts
}
