use std::sync::Arc;

use async_trait::async_trait;

use crate::models::{AgentContext, AgentKind, AgentReply, AgentResponse, ChatError};
use crate::services::agent::{canned, Agent, FreeTextResponder};
use crate::services::completion::CompletionClient;
use crate::services::intent::contains_any;

const SYSTEM_PROMPT: &str = "You are a hospital billing assistant. Provide information about insurance coverage and benefits, explain billing procedures and payment options, help with payment plans, clarify medical costs and assist with insurance verification.

Guidelines:
- Be clear and transparent about costs and explain insurance terms in simple language.
- Be empathetic about financial concerns.
- Direct complex cases to human billing specialists at (555) 123-4570.
- Never provide personal financial advice.

Accepted insurance: Blue Cross Blue Shield, Aetna, Cigna, UnitedHealth, Medicare/Medicaid and most major PPO and HMO plans.
Payment options: insurance billing, self-pay with payment plans, credit/debit cards, cash and financial assistance programs.";

const INSURANCE_KEYWORDS: &[&str] = &[
    "insurance", "coverage", "benefits", "copay", "deductible", "out-of-pocket", "network",
    "in-network", "provider", "policy",
];

const PAYMENT_KEYWORDS: &[&str] = &[
    "payment", "pay", "bill", "charge", "cost", "price", "payment plan", "installment",
    "credit card", "cash",
];

const COST_KEYWORDS: &[&str] = &[
    "how much", "cost", "price", "charge", "fee", "expensive", "cheap", "affordable", "estimate",
];

const STATEMENT_KEYWORDS: &[&str] = &[
    "statement", "bill", "invoice", "receipt", "explanation", "itemized", "breakdown", "charges",
];

const ACCEPTED_INSURANCE_TEXT: &str = "We accept most major insurance providers including:\n\n- Blue Cross Blue Shield\n- Aetna\n- Cigna\n- UnitedHealth\n- Medicare/Medicaid\n- Most major PPO and HMO plans\n\nPlease bring your insurance card and photo ID to your appointment. We'll verify your benefits before your visit.";

const COPAY_TEXT: &str = "Copays and deductibles vary based on your specific insurance plan. Here's what you should know:\n\n- Copay: Fixed amount you pay for each visit (typically $20-50)\n- Deductible: Amount you pay before insurance covers costs\n- Coinsurance: Percentage you pay after meeting deductible\n\nTo get your specific amounts, please provide your insurance information or call our billing department.";

const NETWORK_TEXT: &str = "We are in-network with most major insurance providers. Being in-network means:\n\n- Lower out-of-pocket costs\n- Insurance covers more of your bill\n- Predictable copays and deductibles\n\nTo verify your specific benefits, please provide your insurance information or call (555) 123-4570.";

const PAYMENT_PLAN_TEXT: &str = "We offer flexible payment plans to help manage your medical expenses:\n\n- 0% interest payment plans\n- Monthly installments available\n- Automatic payment options\n- Financial hardship assistance\n\nTo set up a payment plan, please contact our billing department at (555) 123-4570 or visit our financial services office.";

const PAYMENT_METHODS_TEXT: &str = "We accept multiple payment methods:\n\n- Credit/Debit cards (Visa, MasterCard, American Express, Discover)\n- Cash payments\n- Personal checks\n- Health Savings Account (HSA) cards\n- Flexible Spending Account (FSA) cards\n\nPayment is typically due at the time of service unless you have insurance coverage.";

const FINANCIAL_ASSISTANCE_TEXT: &str = "We offer financial assistance programs for qualifying patients:\n\n- Income-based discounts\n- Charity care programs\n- Sliding scale fees\n- Government assistance programs\n\nTo apply for financial assistance, please contact our financial services office or ask for an application at your next visit.";

const VISIT_COSTS_TEXT: &str = "Our typical costs (before insurance) are:\n\n- Initial consultation: $200-300\n- Follow-up visit: $100-150\n- Emergency visit: $500-1000+\n- Specialist consultation: $250-400\n- Lab tests: $50-200\n\nActual costs depend on your insurance coverage. For an accurate estimate, please provide your insurance information.";

const ESTIMATE_TEXT: &str = "To provide an accurate cost estimate, I need:\n\n1. Your insurance information\n2. Type of service needed\n3. Any specific procedures\n\nPlease provide this information or call our billing department at (555) 123-4570 for a detailed estimate.";

const STATEMENT_EXPLANATION_TEXT: &str = "I can help explain your billing statement. Common items include:\n\n- Professional fees (doctor's time)\n- Facility fees (use of hospital/clinic)\n- Lab tests and procedures\n- Medications and supplies\n- Administrative fees\n\nTo get a detailed explanation of your specific charges, please provide your account number or call our billing department.";

const DISPUTE_TEXT: &str = "If you believe there's an error on your bill, we're here to help:\n\n- Contact our billing department at (555) 123-4570\n- Provide your account number and specific concerns\n- We'll review your account within 5-7 business days\n- You can also request an itemized statement\n\nWe want to ensure your bill is accurate and fair.";

/// Insurance, payment, cost and statement questions.
pub struct BillingAgent {
    responder: FreeTextResponder,
}

impl BillingAgent {
    pub fn new(completion: Option<Arc<dyn CompletionClient>>) -> Self {
        Self {
            responder: FreeTextResponder::new(completion, SYSTEM_PROMPT),
        }
    }

    /// Canned answer for the first matching topic, if any.
    fn canned_answer(lower: &str) -> Option<AgentReply> {
        let has = |words: &[&str]| contains_any(lower, words);

        let answer = if has(INSURANCE_KEYWORDS) {
            if has(&["accept", "take"]) {
                Some((ACCEPTED_INSURANCE_TEXT, 0.9))
            } else if has(&["copay", "deductible"]) {
                Some((COPAY_TEXT, 0.8))
            } else if has(&["network", "in-network"]) {
                Some((NETWORK_TEXT, 0.8))
            } else {
                None
            }
        } else if has(PAYMENT_KEYWORDS) {
            if has(&["payment plan", "installment"]) {
                Some((PAYMENT_PLAN_TEXT, 0.9))
            } else if has(&["credit card", "cash"]) {
                Some((PAYMENT_METHODS_TEXT, 0.9))
            } else if has(&["financial assistance", "help"]) {
                Some((FINANCIAL_ASSISTANCE_TEXT, 0.8))
            } else if has(&["consultation", "visit"]) {
                Some((VISIT_COSTS_TEXT, 0.8))
            } else if has(&["explanation", "breakdown"]) {
                Some((STATEMENT_EXPLANATION_TEXT, 0.8))
            } else if has(&["dispute", "wrong"]) {
                Some((DISPUTE_TEXT, 0.8))
            } else {
                None
            }
        } else if has(COST_KEYWORDS) {
            if has(&["consultation", "visit"]) {
                Some((VISIT_COSTS_TEXT, 0.8))
            } else if has(&["estimate", "quote"]) {
                Some((ESTIMATE_TEXT, 0.8))
            } else {
                None
            }
        } else if has(STATEMENT_KEYWORDS) {
            if has(&["explanation", "breakdown"]) {
                Some((STATEMENT_EXPLANATION_TEXT, 0.8))
            } else if has(&["dispute", "wrong"]) {
                Some((DISPUTE_TEXT, 0.8))
            } else {
                None
            }
        } else {
            None
        };

        answer.map(|(text, confidence)| canned(text, confidence))
    }
}

#[async_trait]
impl Agent for BillingAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Billing
    }

    async fn process_message(&self, message: &str, context: &AgentContext) -> Result<AgentReply, ChatError> {
        match Self::canned_answer(&message.to_lowercase()) {
            Some(reply) => Ok(reply),
            None => self.responder.respond(message, context, 0.7).await,
        }
    }

    fn error_response(&self) -> AgentResponse {
        AgentResponse::new(
            "I apologize, but I'm experiencing technical difficulties with billing information. Please contact our billing department directly at (555) 123-4570.",
            0.0,
        )
    }
}
