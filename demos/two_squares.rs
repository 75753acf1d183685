//! Two unit squares on a 4x4 grid, then a small packing found by search.

use geost::{
    DBox, ExternalConstraint, Geost, GeostError, GeostObject, Host, InArea, NonOverlapping, Shape,
    Store, VarId,
};

fn square(store: &mut Store, id: i32, shapes: &[i32], size: i32) -> Result<GeostObject, GeostError> {
    let x = store.new_var(0, size - 1)?;
    let y = store.new_var(0, size - 1)?;
    let shape = store.new_var_from_values(shapes)?;
    let start = store.constant(0)?;
    let duration = store.constant(1)?;
    let end = store.constant(1)?;
    Ok(GeostObject::new(id, vec![x, y], shape, start, duration, end))
}

fn print_domains(host: &Host) {
    for o in host.geost().objects() {
        let doms: Vec<String> = o.coords().iter().map(|&v| host.store().dom(v).to_string()).collect();
        println!(
            "  object {}: x {} y {} shape {}",
            o.id(),
            doms[0],
            doms[1],
            host.store().dom(o.shape())
        );
    }
}

/// Depth-first search over the unfixed variables, smallest value first.
fn search(host: &mut Host) -> bool {
    let next = host
        .geost()
        .objects()
        .iter()
        .flat_map(|o| o.defining_vars())
        .find(|&v| !host.store().is_singleton(v));
    let Some(var) = next else {
        return true;
    };
    let values: Vec<i32> = host.store().dom(var).values().collect();
    for value in values {
        if host.decide(var, value).is_ok() && search(host) {
            return true;
        }
        host.backtrack();
    }
    false
}

fn two_squares() -> Result<(), GeostError> {
    println!("=== Two unit squares ===");
    let mut store = Store::new();
    let a = square(&mut store, 1, &[0], 4)?;
    let b = square(&mut store, 2, &[0], 4)?;
    let (ax, ay): (VarId, VarId) = (a.coords()[0], a.coords()[1]);
    let externals: Vec<Box<dyn ExternalConstraint>> = vec![Box::new(NonOverlapping::new())];
    let geost = Geost::new(vec![a, b], externals, vec![Shape::rectangle(0, vec![1, 1])?], &store)?;
    let mut host = Host::new(store, geost);
    println!("{}", host.geost());

    if host.propagate().is_err() {
        println!("  unexpected failure at the root");
        return Ok(());
    }
    let placed = host.decide(ax, 1).and_then(|_| host.decide(ay, 1));
    println!("Object 1 placed at (1, 1): {}", if placed.is_ok() { "ok" } else { "failed" });
    print_domains(&host);

    let b = &host.geost().objects()[1];
    let (bx, by) = (b.coords()[0], b.coords()[1]);
    let mut feasible = Vec::new();
    for x in 0..4 {
        for y in 0..4 {
            let ok = host.decide(bx, x).is_ok() && host.decide(by, y).is_ok();
            while host.store().level() > 2 {
                host.backtrack();
            }
            if ok {
                feasible.push((x, y));
            }
        }
    }
    println!("Feasible cells for object 2: {} of 16", feasible.len());
    println!("Stats: {}", host.geost().stats());
    Ok(())
}

fn packing() -> Result<(), GeostError> {
    println!("\n=== Packing into a 4x3 box ===");
    let mut store = Store::new();
    let objects = vec![
        square(&mut store, 0, &[0, 1], 4)?,
        square(&mut store, 1, &[0, 1], 4)?,
        square(&mut store, 2, &[2], 4)?,
    ];
    let shapes = vec![
        Shape::rectangle(0, vec![2, 1])?,
        Shape::rectangle(1, vec![1, 2])?,
        // An L of three cells.
        Shape::new(2, vec![DBox::new(vec![0, 0], vec![2, 1])?, DBox::new(vec![0, 1], vec![1, 1])?])?,
    ];
    let externals: Vec<Box<dyn ExternalConstraint>> = vec![
        Box::new(NonOverlapping::new().with_dimensions(vec![0, 1])),
        Box::new(InArea::new(DBox::new(vec![0, 0], vec![4, 3])?)),
    ];
    let geost = Geost::new(objects, externals, shapes, &store)?;
    let mut host = Host::new(store, geost);
    println!("{}", host.geost());

    if host.propagate().is_ok() && search(&mut host) {
        println!("Solution:");
        print_domains(&host);
    } else {
        println!("No packing exists");
    }
    println!("Stats: {}", host.geost().stats());
    Ok(())
}

fn main() -> Result<(), GeostError> {
    two_squares()?;
    packing()
}
