use super::*;
use tokio::sync::Mutex;

#[derive(Default)]
struct InMemoryStateStore {
    cart: Mutex<Option<Vec<CartLine>>>,
    receipt: Mutex<Option<OrderReceipt>>,
    cart_writes: Mutex<u32>,
}

impl InMemoryStateStore {
    async fn persisted_cart(&self) -> Option<Vec<CartLine>> {
        self.cart.lock().await.clone()
    }

    async fn persisted_receipt(&self) -> Option<OrderReceipt> {
        *self.receipt.lock().await
    }

    async fn cart_write_count(&self) -> u32 {
        *self.cart_writes.lock().await
    }
}

#[async_trait]
impl OrderStateStore for InMemoryStateStore {
    async fn load_cart(&self) -> Result<Vec<CartLine>> {
        Ok(self.cart.lock().await.clone().unwrap_or_default())
    }

    async fn save_cart(&self, lines: &[CartLine]) -> Result<()> {
        *self.cart.lock().await = Some(lines.to_vec());
        *self.cart_writes.lock().await += 1;
        Ok(())
    }

    async fn clear_cart(&self) -> Result<()> {
        *self.cart.lock().await = None;
        *self.cart_writes.lock().await += 1;
        Ok(())
    }

    async fn save_receipt(&self, receipt: OrderReceipt) -> Result<()> {
        *self.receipt.lock().await = Some(receipt);
        Ok(())
    }

    async fn load_receipt(&self) -> Result<Option<OrderReceipt>> {
        Ok(*self.receipt.lock().await)
    }

    async fn clear_receipt(&self) -> Result<()> {
        *self.receipt.lock().await = None;
        Ok(())
    }
}

fn menu_item(id: &str, price: u64) -> MenuItem {
    MenuItem {
        id: id.into(),
        name: id.to_string(),
        price,
        comment: None,
        image: None,
    }
}

fn session_with_store() -> (OrderSession, Arc<InMemoryStateStore>) {
    let store = Arc::new(InMemoryStateStore::default());
    (OrderSession::new(store.clone()), store)
}

#[tokio::test]
async fn total_tracks_add_and_decrement_sequences() {
    let (mut session, _) = session_with_store();
    let momo = menu_item("momo", 500);
    let chiya = menu_item("chiya", 300);

    session.add_item(&momo).await.expect("add");
    session.add_item(&momo).await.expect("add");
    session.add_item(&chiya).await.expect("add");
    assert_eq!(session.cart().total(), 1300);

    session.decrement(&momo.id).await.expect("decrement");
    assert_eq!(session.cart().total(), 800);

    for line in session.cart().lines() {
        assert!(line.quantity >= 1);
    }
}

#[tokio::test]
async fn add_then_decrement_restores_prior_cart() {
    let (mut session, _) = session_with_store();
    let momo = menu_item("momo", 500);
    let sekuwa = menu_item("sekuwa", 700);

    session.add_item(&momo).await.expect("add");
    let before = session.cart().lines().to_vec();

    session.add_item(&sekuwa).await.expect("add");
    session.decrement(&sekuwa.id).await.expect("decrement");
    assert_eq!(session.cart().lines(), before.as_slice());

    // When the item was absent before the add, the pair nets out to a no-op.
    session.decrement(&sekuwa.id).await.expect("decrement");
    assert_eq!(session.cart().lines(), before.as_slice());
}

#[tokio::test]
async fn decrement_of_absent_id_is_a_noop() {
    let (mut session, _) = session_with_store();
    session
        .add_item(&menu_item("momo", 500))
        .await
        .expect("add");
    session
        .decrement(&"never-added".into())
        .await
        .expect("decrement");
    assert_eq!(session.cart().total(), 500);
}

#[tokio::test]
async fn clear_empties_cart_and_zeroes_total() {
    let (mut session, store) = session_with_store();
    session
        .add_item(&menu_item("momo", 500))
        .await
        .expect("add");
    session
        .add_item(&menu_item("chiya", 300))
        .await
        .expect("add");

    session.clear_cart().await.expect("clear");
    assert!(session.cart().is_empty());
    assert_eq!(session.cart().total(), 0);
    assert_eq!(store.persisted_cart().await, None);
}

#[tokio::test]
async fn remove_flat_targets_the_owning_line() {
    let (mut session, _) = session_with_store();
    let momo = menu_item("momo", 500);
    let chiya = menu_item("chiya", 300);
    session.add_item(&momo).await.expect("add");
    session.add_item(&momo).await.expect("add");
    session.add_item(&chiya).await.expect("add");

    // Flat projection: [momo, momo, chiya]; removing index 2 hits chiya.
    session.remove_flat(2).await.expect("remove");
    assert_eq!(session.cart().lines().len(), 1);
    assert_eq!(session.cart().lines()[0].quantity, 2);
    assert_eq!(session.cart().total(), 1000);
}

#[tokio::test]
async fn remove_flat_out_of_range_leaves_cart_unchanged() {
    let (mut session, _) = session_with_store();
    session
        .add_item(&menu_item("momo", 500))
        .await
        .expect("add");
    let before = session.cart().lines().to_vec();

    session.remove_flat(7).await.expect("remove");
    assert_eq!(session.cart().lines(), before.as_slice());
}

#[tokio::test]
async fn flat_and_aggregated_projections_share_one_total() {
    let (mut session, _) = session_with_store();
    let momo = menu_item("momo", 500);
    let chiya = menu_item("chiya", 300);
    session.add_item(&momo).await.expect("add");
    session.add_item(&momo).await.expect("add");
    session.add_item(&chiya).await.expect("add");

    let flat_total: u64 = session
        .cart()
        .flat_lines()
        .iter()
        .map(|item| item.price)
        .sum();
    assert_eq!(flat_total, session.cart().total());
    assert_eq!(session.cart().item_count(), 3);
}

#[tokio::test]
async fn empty_cart_payment_is_rejected_in_idle() {
    let (mut session, store) = session_with_store();
    assert_eq!(session.begin_payment(), Err(PaymentError::EmptyCart));
    assert_eq!(session.phase(), OrderPhase::Idle);
    assert_eq!(store.persisted_receipt().await, None);
}

#[tokio::test]
async fn double_submission_is_rejected_while_paying() {
    let (mut session, _) = session_with_store();
    session
        .add_item(&menu_item("momo", 500))
        .await
        .expect("add");

    assert_eq!(session.begin_payment(), Ok(500));
    assert_eq!(
        session.begin_payment(),
        Err(PaymentError::PaymentInProgress)
    );
    assert_eq!(session.phase(), OrderPhase::Paying { amount: 500 });
}

#[tokio::test]
async fn successful_payment_persists_receipt_and_clears_cart() {
    let (mut session, store) = session_with_store();
    let momo = menu_item("momo", 500);
    let chiya = menu_item("chiya", 300);
    session.add_item(&momo).await.expect("add");
    session.add_item(&momo).await.expect("add");
    session.add_item(&chiya).await.expect("add");
    assert_eq!(session.cart().total(), 1300);

    assert_eq!(session.begin_payment(), Ok(1300));
    let paid = session.complete_payment().await.expect("complete");
    assert_eq!(paid, Some(1300));
    assert_eq!(session.phase(), OrderPhase::Completed { amount: 1300 });
    assert!(session.cart().is_empty());
    assert_eq!(
        store.persisted_receipt().await,
        Some(OrderReceipt { amount: 1300 })
    );
    assert_eq!(store.persisted_cart().await, None);

    // Display window elapses: back to Idle with the receipt cleared.
    assert!(session.dismiss_confirmation().await.expect("dismiss"));
    assert_eq!(session.phase(), OrderPhase::Idle);
    assert_eq!(store.persisted_receipt().await, None);
}

#[tokio::test]
async fn hydrate_restores_cart_and_completed_window() {
    let store = Arc::new(InMemoryStateStore::default());
    {
        let mut first = OrderSession::new(store.clone());
        first
            .add_item(&menu_item("momo", 500))
            .await
            .expect("add");
        first.begin_payment().expect("begin");
        first.complete_payment().await.expect("complete");
    }

    // Simulated restart mid confirmation window.
    let mut second = OrderSession::new(store.clone());
    second.hydrate().await.expect("hydrate");
    assert_eq!(second.phase(), OrderPhase::Completed { amount: 500 });
    assert!(second.cart().is_empty());
}

#[tokio::test]
async fn every_mutation_writes_through_to_the_store() {
    let (mut session, store) = session_with_store();
    let momo = menu_item("momo", 500);

    session.add_item(&momo).await.expect("add");
    assert_eq!(store.cart_write_count().await, 1);
    assert_eq!(
        store.persisted_cart().await.expect("blob"),
        session.cart().lines()
    );

    session.decrement(&momo.id).await.expect("decrement");
    assert_eq!(store.cart_write_count().await, 2);
    assert_eq!(store.persisted_cart().await, None);
}
