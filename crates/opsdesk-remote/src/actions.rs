//! Operator actions against the remote API

use crate::client::RemoteApi;
use async_trait::async_trait;
use hyper::Method;
use opsdesk_core::{
    CoreResult, MemberAction, OperatorActions, WithdrawMethod, WithdrawalAction, WithdrawalAddress,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};

/// Amounts travel as JSON numbers
fn number(amount: &Decimal) -> Value {
    amount
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map_or(Value::Null, Value::Number)
}

/// Payout account body; only the chosen method's fields are sent
fn address_body(address: &WithdrawalAddress) -> Value {
    let mut body = Map::new();
    body.insert("name".to_string(), json!(address.name.trim()));
    let mut put = |key: &str, value: Value| {
        if !value.is_null() {
            body.insert(key.to_string(), value);
        }
    };
    match address.withdraw_method {
        WithdrawMethod::BankTransfer => {
            put("withdrawMethod", json!("BankTransfer"));
            put("bankName", json!(address.bank_name));
            put("bankAccountNumber", json!(address.bank_account_number));
            put("branchName", json!(address.branch_name));
            put("district", json!(address.district));
        }
        WithdrawMethod::MobileBanking => {
            put("withdrawMethod", json!("MobileBanking"));
            put("mobileBankingName", json!(address.mobile_banking_name));
            put("mobileBankingAccountNumber", json!(address.mobile_banking_account_number));
        }
    }
    Value::Object(body)
}

/// Method, path and body for a member action
pub fn member_request(user_id: u64, action: &MemberAction) -> (Method, String, Value) {
    match action {
        MemberAction::AddAmount { amount } => (
            Method::PUT,
            format!("/user/recharge/{}", user_id),
            json!({ "amount": number(amount) }),
        ),
        MemberAction::DecreaseAmount { amount } => (
            Method::PUT,
            format!("/user/decrease/{}", user_id),
            json!({ "amount": number(amount) }),
        ),
        MemberAction::Freeze { freeze } => (
            Method::PUT,
            format!("/user/freeze/{}", user_id),
            json!({ "isFreeze": freeze }),
        ),
        MemberAction::UpdateScore { score } => (
            Method::PATCH,
            format!("/user/update-score/{}", user_id),
            json!({ "score": score }),
        ),
        // The path spelling is the server's
        MemberAction::FreezeWithdraw { freeze } => (
            Method::PATCH,
            format!("/user/udpate-freeze-withdraw/{}", user_id),
            json!({ "freezeWithdraw": freeze }),
        ),
        MemberAction::SetOrderRound { round, status } => (
            Method::PUT,
            format!("/user/admin-order-enable-round/{}", user_id),
            json!({ "round": round, "status": status }),
        ),
        MemberAction::AddBonus { amount, notes } => (
            Method::PATCH,
            format!("/user/add-bonus-reward/{}", user_id),
            json!({ "amount": number(amount), "notes": notes.trim() }),
        ),
        MemberAction::AssignProduct {
            product_id,
            order_number,
            mystery_box,
        } => {
            let mut body = json!({ "orderNumber": order_number });
            if let Some(product_id) = product_id {
                body["productId"] = json!(product_id);
            }
            if let Some(reward) = mystery_box {
                body["mysteryboxMethod"] = json!(reward.method.trim());
                // sent as text, like the server stores it
                body["mysteryboxAmount"] = json!(reward.amount.to_string());
            }
            (
                Method::PATCH,
                format!("/user/update-admin-assigned-product/{}", user_id),
                body,
            )
        }
        MemberAction::SetOrderAmounts { amounts } => (
            Method::PATCH,
            format!("/user/update-order-amount/{}", user_id),
            json!({ "amount": amounts.iter().map(number).collect::<Vec<_>>() }),
        ),
        MemberAction::UpdateWithdrawalAddress(address) => (
            Method::PATCH,
            format!("/user/update-withdrawal-address/{}", user_id),
            address_body(address),
        ),
    }
}

pub fn withdrawal_request(id: &str, action: &WithdrawalAction) -> (Method, String, Value) {
    let id = urlencoding::encode(id);
    match action {
        WithdrawalAction::Approve { user_id, amount } => (
            Method::PATCH,
            format!("/withdraw/accept/{}", id),
            json!({ "userId": user_id, "amount": number(amount) }),
        ),
        WithdrawalAction::Reject { remark } => (
            Method::PATCH,
            format!("/withdraw/reject/{}", id),
            json!({ "reviewRemark": remark.trim() }),
        ),
    }
}

#[async_trait]
impl OperatorActions for RemoteApi {
    async fn member_action(&self, user_id: u64, action: &MemberAction) -> CoreResult<String> {
        action.validate()?;
        let (method, path, body) = member_request(user_id, action);
        let message = self.send(method, &path, Some(body)).await?;
        log::info!(target: "opsdesk::remote", "{} on member {}: {}", action.name(), user_id, message);
        Ok(message)
    }

    async fn withdrawal_action(&self, id: &str, action: &WithdrawalAction) -> CoreResult<String> {
        action.validate()?;
        let (method, path, body) = withdrawal_request(id, action);
        let message = self.send(method, &path, Some(body)).await?;
        log::info!(target: "opsdesk::remote", "{} withdrawal {}: {}", action.name(), id, message);
        Ok(message)
    }

    async fn delete_product(&self, product_id: u64) -> CoreResult<String> {
        let path = format!("/product/delete-product/{}", product_id);
        let message = self.send(Method::DELETE, &path, None).await?;
        log::info!(target: "opsdesk::remote", "deleted product {}", product_id);
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::routing::{delete, patch};
    use axum::{Json, Router};
    use opsdesk_config::RemoteConfig;
    use opsdesk_core::models::OrderRound;
    use opsdesk_core::{CoreError, MysteryBox};
    use std::str::FromStr;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_member_requests() {
        let (method, path, body) = member_request(
            42,
            &MemberAction::AddAmount {
                amount: Decimal::from(250),
            },
        );
        assert_eq!(method, Method::PUT);
        assert_eq!(path, "/user/recharge/42");
        assert_eq!(body["amount"], json!(250.0));

        let (method, path, body) = member_request(7, &MemberAction::FreezeWithdraw { freeze: true });
        assert_eq!(method, Method::PATCH);
        assert_eq!(path, "/user/udpate-freeze-withdraw/7");
        assert_eq!(body, json!({"freezeWithdraw": true}));

        let (_, path, body) = member_request(
            7,
            &MemberAction::SetOrderRound {
                round: OrderRound::RoundTwo,
                status: false,
            },
        );
        assert_eq!(path, "/user/admin-order-enable-round/7");
        assert_eq!(body, json!({"round": "round_two", "status": false}));
    }

    #[test]
    fn test_bonus_and_order_amounts_send_numbers() {
        let (method, path, body) = member_request(
            9,
            &MemberAction::AddBonus {
                amount: Decimal::from_str("12.5").unwrap(),
                notes: " welcome ".to_string(),
            },
        );
        assert_eq!(method, Method::PATCH);
        assert_eq!(path, "/user/add-bonus-reward/9");
        assert_eq!(body, json!({"amount": 12.5, "notes": "welcome"}));

        let (_, path, body) = member_request(
            9,
            &MemberAction::SetOrderAmounts {
                amounts: vec![Decimal::from(300), Decimal::from_str("450.75").unwrap()],
            },
        );
        assert_eq!(path, "/user/update-order-amount/9");
        assert_eq!(body, json!({"amount": [300.0, 450.75]}));
    }

    #[test]
    fn test_assign_product_body() {
        let (method, path, body) = member_request(
            4,
            &MemberAction::AssignProduct {
                product_id: Some(17),
                order_number: 5,
                mystery_box: Some(MysteryBox {
                    method: "cash".to_string(),
                    amount: Decimal::from(800),
                }),
            },
        );
        assert_eq!(method, Method::PATCH);
        assert_eq!(path, "/user/update-admin-assigned-product/4");
        assert_eq!(
            body,
            json!({"productId": 17, "orderNumber": 5, "mysteryboxMethod": "cash", "mysteryboxAmount": "800"})
        );

        let (_, _, body) = member_request(
            4,
            &MemberAction::AssignProduct {
                product_id: Some(17),
                order_number: 6,
                mystery_box: None,
            },
        );
        assert_eq!(body, json!({"productId": 17, "orderNumber": 6}));
    }

    #[test]
    fn test_withdrawal_address_sends_only_method_fields() {
        let address = WithdrawalAddress {
            name: "Rahim".to_string(),
            withdraw_method: WithdrawMethod::MobileBanking,
            bank_name: Some("stale bank".to_string()),
            bank_account_number: None,
            branch_name: None,
            district: None,
            mobile_banking_name: Some("bKash".to_string()),
            mobile_banking_account_number: Some(1700000000),
        };
        let (method, path, body) =
            member_request(21, &MemberAction::UpdateWithdrawalAddress(address));
        assert_eq!(method, Method::PATCH);
        assert_eq!(path, "/user/update-withdrawal-address/21");
        assert_eq!(
            body,
            json!({
                "name": "Rahim",
                "withdrawMethod": "MobileBanking",
                "mobileBankingName": "bKash",
                "mobileBankingAccountNumber": 1700000000u64
            })
        );
    }

    #[test]
    fn test_withdrawal_requests() {
        let (method, path, body) = withdrawal_request(
            "65f0",
            &WithdrawalAction::Reject {
                remark: " wrong account ".to_string(),
            },
        );
        assert_eq!(method, Method::PATCH);
        assert_eq!(path, "/withdraw/reject/65f0");
        assert_eq!(body, json!({"reviewRemark": "wrong account"}));
    }

    #[tokio::test]
    async fn test_invalid_action_is_not_sent() {
        // Nothing listens on port 1; a request would surface as a transport error
        let api = RemoteApi::new(&RemoteConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..RemoteConfig::default()
        });
        let err = api
            .member_action(1, &MemberAction::AddAmount { amount: Decimal::ZERO })
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_actions_round_trip_through_server() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let approve_log = Arc::clone(&seen);
        let app = Router::new()
            .route(
                "/withdraw/accept/:id",
                patch(move |Path(id): Path<String>, Json(body): Json<Value>| {
                    let log = Arc::clone(&approve_log);
                    async move {
                        log.lock().unwrap().push((id, body));
                        Json(json!({"success": true, "message": "Withdrawal approved"}))
                    }
                }),
            )
            .route(
                "/product/delete-product/:id",
                delete(|| async { Json(json!({"success": false, "message": "Product is in use"})) }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let api = RemoteApi::new(&RemoteConfig {
            base_url,
            ..RemoteConfig::default()
        });
        let message = api
            .withdrawal_action(
                "w1",
                &WithdrawalAction::Approve {
                    user_id: 9,
                    amount: Decimal::from(100),
                },
            )
            .await
            .unwrap();
        assert_eq!(message, "Withdrawal approved");
        {
            let seen = seen.lock().unwrap();
            assert_eq!(seen[0].0, "w1");
            assert_eq!(seen[0].1["userId"], json!(9));
            assert_eq!(seen[0].1["amount"], json!(100.0));
        }

        let err = api.delete_product(3).await.unwrap_err();
        assert_eq!(
            err,
            CoreError::Rejected {
                message: "Product is in use".to_string()
            }
        );
    }
}
