//! Built-in starter contracts shown before any backend round trip.

use shared::domain::{Template, TemplateId};

struct Builtin {
    id: u32,
    name: &'static str,
    description: &'static str,
    icon: &'static str,
    content: &'static str,
}

const BUILTINS: [Builtin; 8] = [
    Builtin {
        id: 1,
        name: "Non-Disclosure Agreement (NDA)",
        description: "Standard NDA template for business confidentiality",
        icon: "🔒",
        content: r#"MUTUAL NON-DISCLOSURE AGREEMENT

This Non-Disclosure Agreement (this "Agreement") is made effective as of [DATE] by and between [PARTY A] and [PARTY B].

1. Purpose
The parties wish to explore a business opportunity of mutual interest and in connection with this opportunity, each party may disclose to the other certain confidential technical and business information that the disclosing party desires the receiving party to treat as confidential.

2. Confidential Information
"Confidential Information" means any information disclosed by either party to the other party, either directly or indirectly, in writing, orally or by inspection of tangible objects.

3. Term
This Agreement will terminate five (5) years after the Effective Date."#,
    },
    Builtin {
        id: 2,
        name: "Service Agreement",
        description: "Professional services contract template",
        icon: "📋",
        content: r#"SERVICE AGREEMENT

This Service Agreement (the "Agreement") is entered into as of [DATE] by and between [PROVIDER] and [CLIENT].

1. Services
Provider agrees to provide the following services to Client: [DESCRIPTION OF SERVICES]

2. Compensation
Client agrees to compensate Provider as follows: [PAYMENT TERMS]

3. Term
This Agreement shall commence on [START DATE] and continue until [END DATE], unless terminated earlier."#,
    },
    Builtin {
        id: 3,
        name: "Employment Contract",
        description: "Standard employment agreement template",
        icon: "👥",
        content: r#"EMPLOYMENT AGREEMENT

This Employment Agreement (the "Agreement") is entered into as of [DATE] by and between [EMPLOYER] and [EMPLOYEE].

1. Position and Duties
Employee shall serve in the position of [POSITION] and shall perform the duties assigned by Employer.

2. Compensation
Employer shall pay Employee a base salary of [AMOUNT] per year, payable in accordance with Employer's standard payroll practices.

3. Benefits
Employee shall be entitled to participate in all employee benefit plans and programs offered by Employer."#,
    },
    Builtin {
        id: 4,
        name: "Sales Contract",
        description: "Template for product/service sales agreements",
        icon: "🛍️",
        content: r#"SALES AGREEMENT

This Sales Agreement (the "Agreement") is entered into as of [DATE] by and between [SELLER] and [BUYER].

1. Products/Services
Seller agrees to sell and Buyer agrees to purchase the following: [DESCRIPTION]

2. Price and Payment
The total purchase price shall be [AMOUNT], payable as follows: [PAYMENT TERMS]

3. Delivery
Seller shall deliver the products/services as follows: [DELIVERY TERMS]"#,
    },
    Builtin {
        id: 5,
        name: "Lease Agreement",
        description: "Property rental/lease contract template",
        icon: "🏠",
        content: r#"LEASE AGREEMENT

This Lease Agreement (the "Agreement") is entered into as of [DATE] by and between [LANDLORD] and [TENANT].

1. Property
Landlord leases to Tenant the property located at: [ADDRESS]

2. Term
The lease term shall be [DURATION] beginning on [START DATE] and ending on [END DATE].

3. Rent
Tenant shall pay rent of [AMOUNT] per month, due on the [DAY] of each month."#,
    },
    Builtin {
        id: 6,
        name: "Partnership Agreement",
        description: "Business partnership contract template",
        icon: "🤝",
        content: r#"PARTNERSHIP AGREEMENT

This Partnership Agreement (the "Agreement") is entered into as of [DATE] by and between [PARTNER A] and [PARTNER B].

1. Formation
The partners hereby form a partnership under the name [PARTNERSHIP NAME].

2. Capital Contributions
Each partner shall contribute the following: [CONTRIBUTIONS]

3. Profit and Loss Sharing
Partners shall share profits and losses as follows: [TERMS]"#,
    },
    Builtin {
        id: 7,
        name: "Consulting Agreement",
        description: "Professional consulting services template",
        icon: "💡",
        content: r#"CONSULTING AGREEMENT

This Consulting Agreement (the "Agreement") is entered into as of [DATE] by and between [CONSULTANT] and [CLIENT].

1. Services
Consultant shall provide the following consulting services: [SERVICES]

2. Compensation
Client shall pay Consultant [RATE] per [PERIOD], plus approved expenses.

3. Term
This Agreement shall commence on [START DATE] and continue until [END DATE]."#,
    },
    Builtin {
        id: 8,
        name: "Software License",
        description: "Software licensing and usage agreement",
        icon: "💻",
        content: r#"SOFTWARE LICENSE AGREEMENT

This Software License Agreement (the "Agreement") is entered into as of [DATE] by and between [LICENSOR] and [LICENSEE].

1. License Grant
Licensor grants Licensee a [TYPE] license to use the software known as [SOFTWARE NAME].

2. Restrictions
Licensee shall not: [RESTRICTIONS]

3. Term
This license shall be effective for [DURATION] from the effective date."#,
    },
];

/// The eight built-in templates in display order.
pub fn catalog() -> Vec<Template> {
    BUILTINS
        .iter()
        .map(|builtin| Template {
            id: TemplateId(builtin.id.to_string()),
            name: builtin.name.to_string(),
            description: builtin.description.to_string(),
            icon: builtin.icon.to_string(),
            content: builtin.content.to_string(),
        })
        .collect()
}

pub fn find_template(id: &str) -> Option<Template> {
    let id = id.trim();
    catalog().into_iter().find(|template| template.id.0 == id)
}

/// Looks a template up by id, then by case-insensitive name.
pub fn lookup(key: &str) -> Option<Template> {
    find_template(key).or_else(|| {
        let key = key.trim();
        catalog()
            .into_iter()
            .find(|template| template.name.eq_ignore_ascii_case(key))
    })
}

#[cfg(test)]
#[path = "tests/templates_tests.rs"]
mod tests;
