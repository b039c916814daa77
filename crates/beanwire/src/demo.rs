//! Applications served by `beanwire serve`.
//!
//! - `shop`: `CartBean`, a per-session shopping cart
//! - `util`: `EchoBean`, a stateless echo service

use beanwire_endpoint::{
    Application, ApplicationRegistry, Args, BeanType, InvocationError, MethodTable,
};
use beanwire_proto::Value;

#[derive(Debug, Clone, PartialEq)]
struct CartItem {
    name: String,
    price: i64,
    quantity: i64,
}

#[derive(Debug, Default)]
struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    fn total(&self) -> Result<i64, InvocationError> {
        self.items
            .iter()
            .try_fold(0i64, |sum, item| {
                item.price
                    .checked_mul(item.quantity)
                    .and_then(|line| sum.checked_add(line))
            })
            .ok_or_else(|| InvocationError::failed("cart total overflows"))
    }

    fn count(&self) -> Result<i64, InvocationError> {
        self.items
            .iter()
            .try_fold(0i64, |sum, item| sum.checked_add(item.quantity))
            .ok_or_else(|| InvocationError::failed("cart item count overflows"))
    }
}

fn add_item(cart: &mut Cart, args: Args<'_>) -> Result<Value, InvocationError> {
    let name = args.str("name")?.to_string();
    let price = args.i64("price")?;
    let quantity = match args.get("quantity") {
        Some(_) => args.i64("quantity")?,
        None => 1,
    };
    if price < 0 || quantity <= 0 {
        return Err(InvocationError::failed(format!(
            "invalid item {name}: price {price}, quantity {quantity}"
        )));
    }

    let existing = cart
        .items
        .iter()
        .position(|item| item.name == name && item.price == price);
    match existing {
        Some(index) => {
            let item = &mut cart.items[index];
            item.quantity = item.quantity.checked_add(quantity).ok_or_else(|| {
                InvocationError::failed(format!("quantity of {name} overflows"))
            })?;
        }
        None => cart.items.push(CartItem {
            name,
            price,
            quantity,
        }),
    }

    // Undo the addition if the cart can no longer be totalled.
    match cart.total().and_then(|total| cart.count().map(|_| total)) {
        Ok(total) => Ok(Value::Int(total)),
        Err(err) => {
            match existing {
                Some(index) => cart.items[index].quantity -= quantity,
                None => {
                    cart.items.pop();
                }
            }
            Err(err)
        }
    }
}

fn cart_bean() -> BeanType {
    let table = MethodTable::<Cart>::new("CartBean")
        .method("addItem", add_item)
        .method("getTotal", |cart, _| cart.total().map(Value::Int))
        .method("itemCount", |cart, _| cart.count().map(Value::Int))
        .method("clear", |cart, _| {
            cart.items.clear();
            Ok(Value::Null)
        });
    BeanType::new(table, Cart::default)
}

fn echo_bean() -> BeanType {
    let table = MethodTable::<()>::new("EchoBean")
        .method("echo", |_, args| {
            if args.len() == 1 {
                return Ok(args.value(0)?.clone());
            }
            let values = (0..args.len())
                .map(|index| args.value(index).cloned())
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List(values))
        })
        .method("fail", |_, args| {
            let message = args
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("requested failure");
            Err(InvocationError::failed(message))
        });
    BeanType::new(table, || ())
}

pub fn shop() -> Application {
    Application::new("shop").with_bean(cart_bean())
}

pub fn util() -> Application {
    Application::new("util").with_bean(echo_bean())
}

pub fn registry() -> ApplicationRegistry {
    ApplicationRegistry::new().with(shop()).with(util())
}
