use std::time::Duration;

use super::*;

#[tokio::test]
async fn open_token_grants_access() {
    let token = WriteToken::new();
    let guard = token.acquire().await;
    assert!(guard.is_ok());
}

#[tokio::test]
async fn sealed_token_rejects_writers() {
    let token = WriteToken::new();
    token.acquire().await.unwrap().seal();
    assert!(token.is_sealed().await);
    assert!(matches!(token.acquire().await, Err(ClientError::AlreadySubmitted)));
}

#[tokio::test]
async fn dropping_guard_without_seal_reopens() {
    let token = WriteToken::new();
    drop(token.acquire().await.unwrap());
    assert!(!token.is_sealed().await);
    assert!(token.acquire().await.is_ok());
}

#[tokio::test]
async fn pre_sealed_token_is_sealed() {
    assert!(WriteToken::sealed().is_sealed().await);
}

#[tokio::test(start_paused = true)]
async fn waiting_writer_sees_seal_from_holder() {
    let token = WriteToken::new();
    let guard = token.acquire().await.unwrap();

    let waiter = {
        let token = token.clone();
        tokio::spawn(async move { token.acquire().await.map(drop) })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!waiter.is_finished());

    guard.seal();
    let result = waiter.await.unwrap();
    assert!(matches!(result, Err(ClientError::AlreadySubmitted)));
}
