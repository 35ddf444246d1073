//! tests/user_tests.rs

use crate::models::user_model::{LoginRequest, RegisterRequest, DEFAULT_PLAN};
use crate::services::user_service::{validate_password, validate_registration, AuthError, UserService};
use crate::tests::test_pool;

fn register_request(email: &str) -> RegisterRequest {
    RegisterRequest {
        name: "  Maria Silva ".to_string(),
        email: email.to_string(),
        password: "Senha@123".to_string(),
    }
}

fn invalid_message(result: Result<(), AuthError>) -> String {
    match result {
        Err(AuthError::Invalid(message)) => message,
        other => panic!("se esperaba Invalid, llegó {:?}", other),
    }
}

#[test]
fn password_rules_in_order() {
    assert!(validate_password("Senha@123").is_ok());
    assert_eq!(
        invalid_message(validate_password("S@1a")),
        "Senha deve ter no mínimo 8 caracteres"
    );
    assert_eq!(
        invalid_message(validate_password("senha@123")),
        "Senha deve conter pelo menos uma letra maiúscula"
    );
    assert_eq!(
        invalid_message(validate_password("SENHA@123")),
        "Senha deve conter pelo menos uma letra minúscula"
    );
    assert_eq!(
        invalid_message(validate_password("Senha@abc")),
        "Senha deve conter pelo menos um número"
    );
    assert_eq!(
        invalid_message(validate_password("Senha1234")),
        "Senha deve conter pelo menos um caractere especial"
    );
}

#[test]
fn registration_normalizes_name_and_email() {
    let (name, email) = validate_registration(&register_request("Maria@Exemplo.COM")).unwrap();
    assert_eq!(name, "Maria Silva");
    assert_eq!(email, "maria@exemplo.com");

    let short_name = RegisterRequest {
        name: " Al ".to_string(),
        ..register_request("a@b.com")
    };
    assert!(matches!(
        validate_registration(&short_name),
        Err(AuthError::Invalid(m)) if m == "Nome deve ter no mínimo 3 caracteres"
    ));

    assert!(matches!(
        validate_registration(&register_request("sem-arroba")),
        Err(AuthError::Invalid(m)) if m == "Email inválido"
    ));
}

#[actix_rt::test]
async fn register_then_login() {
    let service = UserService::new(test_pool().await, 4);

    let user = service
        .register(&register_request("maria@exemplo.com"))
        .await
        .unwrap();
    assert_eq!(user.name, "Maria Silva");
    assert_eq!(user.plan, DEFAULT_PLAN);
    assert_eq!(user.analyses_count, 0);

    let logged = service
        .login(&LoginRequest {
            email: "MARIA@exemplo.com".to_string(),
            password: "Senha@123".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(logged.id, user.id);
}

#[actix_rt::test]
async fn duplicate_email_is_rejected() {
    let service = UserService::new(test_pool().await, 4);
    service
        .register(&register_request("maria@exemplo.com"))
        .await
        .unwrap();

    let err = service
        .register(&register_request("Maria@Exemplo.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::EmailTaken));
    assert_eq!(err.to_string(), "Email já cadastrado");
}

#[actix_rt::test]
async fn wrong_credentials_share_one_message() {
    let service = UserService::new(test_pool().await, 4);
    service
        .register(&register_request("maria@exemplo.com"))
        .await
        .unwrap();

    for (email, password) in [
        ("maria@exemplo.com", "Errada@123"),
        ("ninguem@exemplo.com", "Senha@123"),
    ] {
        let err = service
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Email ou senha incorretos");
    }
}

#[actix_rt::test]
async fn analyses_counter_increments() {
    let service = UserService::new(test_pool().await, 4);
    let user = service
        .register(&register_request("maria@exemplo.com"))
        .await
        .unwrap();

    service.increment_analyses(&user.id).await.unwrap();
    service.increment_analyses(&user.id).await.unwrap();

    let reloaded = service.get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(reloaded.analyses_count, 2);
    assert!(service.get_user("nao-existe").await.unwrap().is_none());
}
