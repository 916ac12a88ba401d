//! Aquarium entry point
//!
//! In the browser this wires the page into the simulation and the overlay.
//! Natively it runs a short headless session and logs what happened.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        Document, Element, HtmlElement, MouseEvent, MutationObserver, MutationObserverInit,
        MutationRecord, PageTransitionEvent, TouchEvent, Window,
    };

    use aquarium::overlay::{Adjustment, OverlayManager};
    use aquarium::platform::{
        FrameCallback, LoopHandle, NodeCategory, NodeId, NodeInfo, NodeTable, ObservedChild,
        OverlayLayer, SceneHost, TickHandle, TickSource, TrackedElement, run_loop,
    };
    use aquarium::sim::{Aquarium, Direction, SceneWatcher, SimulationLoop, Transform};
    use aquarium::sorting::{Bowl, BowlColor, FruitId, Placement, SortingBoard, is_compact_viewport};
    use aquarium::{AquariumConfig, Bounds, PlatformClass, Rect, SetupError};

    const CONTAINER_ID: &str = "aquarium";
    const NODE_ATTR: &str = "data-node-id";
    const BOUND_ATTR: &str = "data-bound";
    const FRUIT_ATTR: &str = "data-fruit-id";

    fn px(v: f32) -> String {
        format!("{}px", v)
    }

    fn client_rect(element: &Element) -> Rect {
        let r = element.get_bounding_client_rect();
        Rect::new(r.left() as f32, r.top() as f32, r.width() as f32, r.height() as f32)
    }

    /// A child of the tank as the node table sees it
    #[derive(Clone)]
    struct DomNode(HtmlElement);

    impl std::ops::Deref for DomNode {
        type Target = HtmlElement;

        fn deref(&self) -> &HtmlElement {
            &self.0
        }
    }

    impl TrackedElement for DomNode {
        fn stored_id(&self) -> Option<NodeId> {
            self.0
                .get_attribute(NODE_ATTR)
                .and_then(|v| v.parse().ok())
                .map(NodeId)
        }

        fn adopt(&self, id: NodeId) -> bool {
            if self.0.set_attribute(NODE_ATTR, &id.0.to_string()).is_err() {
                return false;
            }
            if self.0.class_list().contains("fish") {
                // Fish are positioned purely by transform
                let style = self.0.style();
                let _ = style.set_property("position", "absolute");
                let _ = style.set_property("top", "0");
                let _ = style.set_property("left", "0");
                let _ = style.set_property("will-change", "transform");
            }
            true
        }

        fn is_trackable(&self) -> bool {
            let classes = self.0.class_list();
            classes.contains("fish") || classes.contains("bottom-object")
        }

        fn is_attached(&self) -> bool {
            self.0.parent_element().is_some_and(|p| p.id() == CONTAINER_ID)
        }
    }

    /// Scene host over the `#aquarium` element and its direct children
    struct DomScene {
        window: Window,
        container: HtmlElement,
        nodes: NodeTable<DomNode>,
    }

    impl DomScene {
        fn new(window: Window, container: HtmlElement) -> Self {
            let mut nodes = NodeTable::new();
            let children = container.children();
            for i in 0..children.length() {
                if let Some(child) = children.item(i).and_then(|c| c.dyn_into::<HtmlElement>().ok()) {
                    nodes.track(&DomNode(child));
                }
            }
            Self {
                window,
                container,
                nodes,
            }
        }

        fn origin(&self) -> Vec2 {
            client_rect(&self.container).pos
        }
    }

    impl SceneHost for DomScene {
        fn container_bounds(&self) -> Option<Bounds> {
            let rect = client_rect(&self.container);
            Some(Bounds::new(rect.size.x, rect.size.y))
        }

        fn children(&self) -> Vec<NodeId> {
            let children = self.container.children();
            (0..children.length())
                .filter_map(|i| children.item(i))
                .filter_map(|child| child.dyn_into::<HtmlElement>().ok())
                .filter_map(|child| DomNode(child).stored_id())
                .filter(|id| self.nodes.contains(*id))
                .collect()
        }

        fn describe(&self, node: NodeId) -> Option<NodeInfo> {
            let element = self.nodes.get(node)?;
            let classes = element.class_list();
            let category = if classes.contains("fish") {
                NodeCategory::Fish
            } else if classes.contains("bottom-object") {
                NodeCategory::BottomObject
            } else {
                NodeCategory::Other
            };
            let depth = self
                .window
                .get_computed_style(element)
                .ok()
                .flatten()
                .and_then(|style| style.get_property_value("z-index").ok())
                .and_then(|z| z.parse().ok());

            Some(NodeInfo {
                category,
                src: element.get_attribute("src").unwrap_or_default(),
                facing_left: classes.contains("left"),
                depth,
            })
        }

        fn node_size(&self, node: NodeId) -> Vec2 {
            self.nodes
                .get(node)
                .map(|e| Vec2::new(e.client_width() as f32, e.client_height() as f32))
                .unwrap_or(Vec2::ZERO)
        }

        fn layout_rect(&self, node: NodeId) -> Option<Rect> {
            let element = self.nodes.get(node)?;
            Some(client_rect(element).translated(-self.origin()))
        }

        fn write_transform(&mut self, node: NodeId, transform: &Transform) {
            if let Some(element) = self.nodes.get(node) {
                let _ = element.style().set_property("transform", &transform.to_css());
            }
        }

        fn write_sway(&mut self, node: NodeId, degrees: f32) {
            if let Some(element) = self.nodes.get(node) {
                let _ = element
                    .style()
                    .set_property("transform", &format!("rotate({}deg)", degrees));
            }
        }

        fn set_facing(&mut self, node: NodeId, direction: Direction) {
            if let Some(element) = self.nodes.get(node) {
                let _ = element
                    .class_list()
                    .toggle_with_force("left", direction == Direction::Left);
            }
        }

        fn set_depth(&mut self, node: NodeId, depth: i32) {
            if let Some(element) = self.nodes.get(node) {
                let _ = element.style().set_property("z-index", &depth.to_string());
            }
        }
    }

    /// Full-size layer above the tank holding one div per region
    struct DomOverlay {
        document: Document,
        root: HtmlElement,
        regions: HashMap<NodeId, HtmlElement>,
    }

    impl DomOverlay {
        fn new(document: Document, container: &HtmlElement) -> Result<Self, JsValue> {
            let root: HtmlElement = document.create_element("div")?.dyn_into()?;
            let style = root.style();
            style.set_property("position", "absolute")?;
            style.set_property("left", "0")?;
            style.set_property("top", "0")?;
            style.set_property("width", "100%")?;
            style.set_property("height", "100%")?;
            style.set_property("z-index", "9999")?;
            style.set_property("pointer-events", "none")?;
            container.append_child(&root)?;
            Ok(Self {
                document,
                root,
                regions: HashMap::new(),
            })
        }
    }

    impl OverlayLayer for DomOverlay {
        fn create_region(&mut self, bound: NodeId) {
            let Some(div) = self
                .document
                .create_element("div")
                .ok()
                .and_then(|e| e.dyn_into::<HtmlElement>().ok())
            else {
                log::warn!("Could not create region for {:?}", bound);
                return;
            };
            div.set_class_name("select-box");
            let _ = div.set_attribute(BOUND_ATTR, &bound.0.to_string());
            let style = div.style();
            let _ = style.set_property("position", "absolute");
            let _ = style.set_property("pointer-events", "auto");
            let _ = style.set_property("transform-origin", "center center");
            let _ = self.root.append_child(&div);
            self.regions.insert(bound, div);
        }

        fn remove_region(&mut self, bound: NodeId) {
            if let Some(div) = self.regions.remove(&bound) {
                div.remove();
            }
        }

        fn place_region(&mut self, bound: NodeId, base: &Rect, adjustment: &Adjustment) {
            let Some(div) = self.regions.get(&bound) else {
                return;
            };
            let style = div.style();
            let _ = style.set_property("left", &px(base.pos.x));
            let _ = style.set_property("top", &px(base.pos.y));
            let _ = style.set_property("width", &px(base.size.x));
            let _ = style.set_property("height", &px(base.size.y));
            let _ = style.set_property("transform", &adjustment.to_css());
        }

        fn set_active(&mut self, bound: NodeId, active: bool) {
            if let Some(div) = self.regions.get(&bound) {
                let _ = div.class_list().toggle_with_force("active", active);
            }
        }
    }

    /// `requestAnimationFrame` as a tick source
    struct RafTickSource {
        window: Window,
    }

    impl TickSource for RafTickSource {
        fn schedule(&self, callback: FrameCallback) -> TickHandle {
            let closure = Closure::once_into_js(move |now: f64| callback(now));
            match self.window.request_animation_frame(closure.unchecked_ref()) {
                Ok(id) => TickHandle(id as u64),
                Err(e) => {
                    log::error!("requestAnimationFrame failed: {:?}", e);
                    TickHandle(0)
                }
            }
        }

        fn cancel(&self, handle: TickHandle) {
            let _ = self.window.cancel_animation_frame(handle.0 as i32);
        }
    }

    /// Everything the two frame loops and the event handlers share
    struct Page {
        scene: DomScene,
        layer: DomOverlay,
        tank: Aquarium,
        overlay: OverlayManager,
        sim: SimulationLoop,
        watcher: SceneWatcher,
    }

    impl Page {
        fn on_mutations(&mut self, records: &js_sys::Array) {
            let mut batch = Vec::new();
            for record in records.iter() {
                let Ok(record) = record.dyn_into::<MutationRecord>() else {
                    continue;
                };
                let added = record.added_nodes();
                for i in 0..added.length() {
                    if let Some(e) = added.item(i).and_then(|n| n.dyn_into::<HtmlElement>().ok()) {
                        batch.push(ObservedChild::Added(DomNode(e)));
                    }
                }
                let removed = record.removed_nodes();
                for i in 0..removed.length() {
                    if let Some(e) = removed.item(i).and_then(|n| n.dyn_into::<HtmlElement>().ok()) {
                        batch.push(ObservedChild::Removed(DomNode(e)));
                    }
                }
            }

            let changes = self.scene.nodes.translate(batch);
            if changes.is_empty() {
                return;
            }
            let membership = self.watcher.apply(&changes, &mut self.tank, &self.scene);
            self.overlay
                .apply_membership(&membership, &self.scene, &self.tank.registry, &mut self.layer);
        }
    }

    fn detect_platform(window: &Window) -> PlatformClass {
        let user_agent = window.navigator().user_agent().unwrap_or_default();
        let width = window.inner_width().ok().and_then(|w| w.as_f64()).unwrap_or(0.0);
        let has_touch = js_sys::Reflect::has(window, &JsValue::from_str("ontouchstart")).unwrap_or(false);
        PlatformClass::detect(&user_agent, width, has_touch)
    }

    fn load_config(container: &HtmlElement, platform: PlatformClass) -> AquariumConfig {
        match container.get_attribute("data-config") {
            Some(json) => AquariumConfig::from_json(&json, platform).unwrap_or_else(|e| {
                log::warn!("Ignoring data-config: {}", e);
                AquariumConfig::for_platform(platform)
            }),
            None => AquariumConfig::for_platform(platform),
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Aquarium starting...");

        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        if document.query_selector(".fruits").ok().flatten().is_some() {
            sorting_page::run(&window, &document);
        }

        let Some(container) = document
            .get_element_by_id(CONTAINER_ID)
            .and_then(|e| e.dyn_into::<HtmlElement>().ok())
        else {
            if document.query_selector(".fruits").ok().flatten().is_none() {
                log::error!(
                    "{}",
                    SetupError::MissingContainer {
                        id: CONTAINER_ID.to_string()
                    }
                );
            }
            return;
        };

        let platform = detect_platform(&window);
        let config = load_config(&container, platform);
        let scene = DomScene::new(window.clone(), container.clone());

        let seed = js_sys::Date::now() as u64;
        let tank = match Aquarium::new(config, &scene, seed) {
            Ok(tank) => tank,
            Err(e) => {
                log::error!("Aquarium setup failed: {}", e);
                return;
            }
        };

        let mut layer = match DomOverlay::new(document.clone(), &container) {
            Ok(layer) => layer,
            Err(e) => {
                log::error!("Overlay setup failed: {:?}", e);
                return;
            }
        };
        let overlay = OverlayManager::setup(&scene, &tank.registry, &mut layer);

        let now = window.performance().map(|p| p.now()).unwrap_or(0.0);
        let page = Rc::new(RefCell::new(Page {
            scene,
            layer,
            tank,
            overlay,
            sim: SimulationLoop::starting_at(now),
            watcher: SceneWatcher::new(),
        }));

        let observer = match observe_children(&container, page.clone()) {
            Ok(observer) => Some(observer),
            Err(e) => {
                log::warn!("Scene changes will not be tracked: {:?}", e);
                None
            }
        };
        setup_region_clicks(&page);
        setup_resize(&window, page.clone());

        // Simulation first, then overlay, on the same refresh
        let source = Rc::new(RafTickSource {
            window: window.clone(),
        });
        let sim_page = page.clone();
        let sim_loop = run_loop(source.clone(), move |now| {
            let page = &mut *sim_page.borrow_mut();
            page.sim.frame(&mut page.tank, &mut page.scene, now);
        });
        let overlay_page = page.clone();
        let overlay_loop = run_loop(source, move |_| {
            let page = &mut *overlay_page.borrow_mut();
            page.overlay.frame(&page.tank.registry, &mut page.layer);
        });

        setup_teardown(&window, vec![sim_loop, overlay_loop], observer);

        log::info!("Aquarium running with seed {}", seed);
    }

    fn observe_children(
        container: &HtmlElement,
        page: Rc<RefCell<Page>>,
    ) -> Result<MutationObserver, JsValue> {
        let closure = Closure::<dyn FnMut(_, _)>::new(
            move |records: js_sys::Array, _observer: MutationObserver| {
                page.borrow_mut().on_mutations(&records);
            },
        );
        let observer = MutationObserver::new(closure.as_ref().unchecked_ref())?;
        closure.forget();

        let init = MutationObserverInit::new();
        init.set_child_list(true);
        observer.observe_with_options(container, &init)?;
        Ok(observer)
    }

    fn setup_region_clicks(page: &Rc<RefCell<Page>>) {
        let root = page.borrow().layer.root.clone();
        let page = page.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
            let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
                return;
            };
            let Some(bound) = target
                .get_attribute(BOUND_ATTR)
                .and_then(|v| v.parse().ok())
                .map(NodeId)
            else {
                return;
            };
            event.stop_propagation();
            let page = &mut *page.borrow_mut();
            if let Some(active) = page.overlay.toggle(bound, &mut page.layer) {
                log::debug!("Region {:?} active: {}", bound, active);
            }
        });
        let _ = root.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_resize(window: &Window, page: Rc<RefCell<Page>>) {
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let page = &mut *page.borrow_mut();
            page.overlay.relayout_static(&page.scene, &mut page.layer);
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_teardown(window: &Window, loops: Vec<LoopHandle>, observer: Option<MutationObserver>) {
        let closure = Closure::<dyn FnMut(_)>::new(move |event: PageTransitionEvent| {
            // Pages kept in the back-forward cache resume as they were
            if event.persisted() {
                return;
            }
            for handle in &loops {
                handle.stop();
            }
            if let Some(observer) = &observer {
                observer.disconnect();
            }
            log::info!("Aquarium stopped");
        });
        let _ = window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Fruit sorting page: `.fruits` holds the gummies, `.bowl` images are
    /// the targets (their alt text starts with the color)
    mod sorting_page {
        use super::*;

        struct Sorting {
            window: Window,
            document: Document,
            area: HtmlElement,
            board: SortingBoard,
            /// Bowl elements, same order as the board's bowls
            bowls: Vec<Element>,
            images: HashMap<FruitId, HtmlElement>,
            ghost: Option<HtmlElement>,
            rng: Pcg32,
        }

        impl Sorting {
            fn origin(&self) -> Vec2 {
                client_rect(&self.area).pos
            }

            fn compact(&self) -> bool {
                let width = self.window.inner_width().ok().and_then(|w| w.as_f64()).unwrap_or(0.0);
                is_compact_viewport(width)
            }

            fn spawn_round(&mut self) {
                for (_, image) in self.images.drain() {
                    image.remove();
                }
                let width = self.window.inner_width().ok().and_then(|w| w.as_f64()).unwrap_or(0.0);
                // Gummies are 15vw across
                let fruit_size = (width * 0.15) as f32;
                let container = Vec2::new(self.area.client_width() as f32, self.area.client_height() as f32);
                let compact = self.compact();

                let pieces = self
                    .board
                    .spawn_round(container, fruit_size, compact, &mut self.rng)
                    .to_vec();
                for piece in pieces {
                    let Some(img) = self
                        .document
                        .create_element("img")
                        .ok()
                        .and_then(|e| e.dyn_into::<HtmlElement>().ok())
                    else {
                        continue;
                    };
                    img.set_class_name("fruit");
                    let _ = img.set_attribute("src", piece.fruit.asset());
                    let _ = img.set_attribute("alt", piece.fruit.name());
                    let _ = img.set_attribute(FRUIT_ATTR, &piece.id.to_string());
                    let style = img.style();
                    let _ = style.set_property("position", "absolute");
                    let _ = style.set_property("left", &px(piece.home.pos.x));
                    let _ = style.set_property("top", &px(piece.home.pos.y));
                    let _ = style.set_property("width", &px(piece.home.size.x));
                    let _ = style.set_property("height", &px(piece.home.size.y));
                    let _ = self.area.append_child(&img);
                    self.images.insert(piece.id, img);
                }
            }

            /// Bowl rects in area coordinates, read fresh from layout
            fn refresh_bowls(&mut self) {
                let origin = self.origin();
                for (i, bowl) in self.bowls.iter().enumerate() {
                    self.board.set_bowl_rect(i, client_rect(bowl).translated(-origin));
                }
            }

            fn start_drag(&mut self, id: FruitId, client: Vec2) {
                let pointer = client - self.origin();
                if !self.board.start_drag(id, pointer) {
                    return;
                }
                let Some(image) = self.images.get(&id) else {
                    return;
                };
                let _ = image.style().set_property("opacity", "0");

                let ghost = image
                    .clone_node()
                    .ok()
                    .and_then(|n| n.dyn_into::<HtmlElement>().ok());
                if let (Some(ghost), Some(body)) = (ghost, self.document.body()) {
                    let _ = ghost.remove_attribute(FRUIT_ATTR);
                    let style = ghost.style();
                    let _ = style.set_property("position", "fixed");
                    let _ = style.set_property("pointer-events", "none");
                    let _ = style.set_property("z-index", "10");
                    let _ = style.set_property("opacity", "0.9");
                    let _ = body.append_child(&ghost);
                    self.ghost = Some(ghost);
                    self.move_ghost(client);
                }
            }

            fn move_ghost(&mut self, client: Vec2) {
                let origin = self.origin();
                let Some(rect) = self.board.drag_to(client - origin) else {
                    return;
                };
                if let Some(ghost) = &self.ghost {
                    let style = ghost.style();
                    let _ = style.set_property("left", &px(rect.pos.x + origin.x));
                    let _ = style.set_property("top", &px(rect.pos.y + origin.y));
                }
            }

            fn end_drag(&mut self) {
                if let Some(ghost) = self.ghost.take() {
                    ghost.remove();
                }
                self.refresh_bowls();
                if let Some(placement) = self.board.end_drag() {
                    self.settle(placement);
                }
            }

            fn click_bowl(&mut self, index: usize) {
                self.refresh_bowls();
                if let Some(placement) = self.board.click_bowl(index) {
                    self.settle(placement);
                }
            }

            fn settle(&mut self, placement: Placement) {
                match placement {
                    Placement::Accepted {
                        fruit,
                        bowl,
                        round_complete,
                    } => {
                        if let Some(image) = self.images.remove(&fruit) {
                            image.remove();
                        }
                        log::debug!("Fruit {} sorted into bowl {}", fruit, bowl);
                        if round_complete {
                            self.spawn_round();
                        }
                    }
                    Placement::Rejected { fruit, .. } => {
                        if let Some(image) = self.images.get(&fruit) {
                            let _ = image.style().set_property("opacity", "1");
                        }
                    }
                }
            }
        }

        fn fruit_id(event: &web_sys::Event) -> Option<FruitId> {
            event
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .and_then(|e| e.get_attribute(FRUIT_ATTR))
                .and_then(|v| v.parse().ok())
        }

        fn touch_point(event: &TouchEvent) -> Option<Vec2> {
            let touch = event.touches().get(0)?;
            Some(Vec2::new(touch.client_x() as f32, touch.client_y() as f32))
        }

        fn mouse_point(event: &MouseEvent) -> Vec2 {
            Vec2::new(event.client_x() as f32, event.client_y() as f32)
        }

        pub fn run(window: &Window, document: &Document) {
            let Some(area) = document
                .query_selector(".fruits")
                .ok()
                .flatten()
                .and_then(|e| e.dyn_into::<HtmlElement>().ok())
            else {
                return;
            };

            let mut bowls = Vec::new();
            let mut bowl_elements = Vec::new();
            if let Ok(list) = document.query_selector_all(".bowl") {
                for i in 0..list.length() {
                    let Some(element) = list.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                        continue;
                    };
                    let label = element.get_attribute("alt").unwrap_or_default();
                    let Some(color) = BowlColor::from_label(&label) else {
                        log::warn!("Bowl label {:?} has no known color", label);
                        continue;
                    };
                    bowls.push(Bowl {
                        color,
                        rect: Rect::default(),
                    });
                    bowl_elements.push(element);
                }
            }

            let sorting = Rc::new(RefCell::new(Sorting {
                window: window.clone(),
                document: document.clone(),
                area: area.clone(),
                board: SortingBoard::new(bowls),
                bowls: bowl_elements.clone(),
                images: HashMap::new(),
                ghost: None,
                rng: Pcg32::seed_from_u64(js_sys::Date::now() as u64),
            }));
            sorting.borrow_mut().spawn_round();

            // Fruit clicks select; presses start a drag
            {
                let sorting = sorting.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                    if let Some(id) = fruit_id(&event) {
                        event.stop_propagation();
                        sorting.borrow_mut().board.click_fruit(id);
                    }
                });
                let _ = area.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
            {
                let sorting = sorting.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                    if let Some(id) = fruit_id(&event) {
                        event.prevent_default();
                        sorting.borrow_mut().start_drag(id, mouse_point(&event));
                    }
                });
                let _ = area.add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
                closure.forget();
            }
            {
                let sorting = sorting.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                    if let (Some(id), Some(point)) = (fruit_id(&event), touch_point(&event)) {
                        event.prevent_default();
                        sorting.borrow_mut().start_drag(id, point);
                    }
                });
                let _ = area.add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
                closure.forget();
            }

            // Pointer tracking while a drag is live
            {
                let sorting = sorting.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                    let mut s = sorting.borrow_mut();
                    if s.board.drag().is_some() {
                        s.move_ghost(mouse_point(&event));
                    }
                });
                let _ = document.add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
                closure.forget();
            }
            {
                let sorting = sorting.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                    let mut s = sorting.borrow_mut();
                    if let (true, Some(point)) = (s.board.drag().is_some(), touch_point(&event)) {
                        event.prevent_default();
                        s.move_ghost(point);
                    }
                });
                let _ = document.add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
                closure.forget();
            }
            for kind in ["mouseup", "touchend"] {
                let sorting = sorting.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                    let mut s = sorting.borrow_mut();
                    if s.board.drag().is_some() {
                        s.end_drag();
                    }
                });
                let _ = document.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref());
                closure.forget();
            }

            // Click-to-sort
            for (index, bowl) in bowl_elements.iter().enumerate() {
                let sorting = sorting.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                    event.stop_propagation();
                    sorting.borrow_mut().click_bowl(index);
                });
                let _ = bowl.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }

            log::info!("Fruit sorting ready with {} bowls", bowl_elements.len());
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    web::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Aquarium (native) starting...");
    log::info!("Native mode runs a headless session - build for wasm32 for the web version");

    if let Err(e) = demo::run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use aquarium::overlay::{ClickOutcome, OverlayManager};
    use aquarium::platform::headless::{HeadlessOverlay, HeadlessScene, ManualTickSource};
    use aquarium::platform::{NodeInfo, run_loop};
    use aquarium::sim::{Aquarium, SceneWatcher, SimulationLoop};
    use aquarium::sorting::{Bowl, BowlColor, Placement, SortingBoard};
    use aquarium::{AquariumConfig, PlatformClass, Rect, SetupError};

    /// Refresh rate of the simulated display
    const HZ: f64 = 60.0;
    const SECONDS: u32 = 60;

    struct Session {
        scene: HeadlessScene,
        layer: HeadlessOverlay,
        tank: Aquarium,
        overlay: OverlayManager,
        sim: SimulationLoop,
        watcher: SceneWatcher,
        respawns: usize,
    }

    impl Session {
        fn sync_scene(&mut self) {
            let changes = self.scene.take_changes();
            let joined = self.watcher.apply(&changes, &mut self.tank, &self.scene);
            self.overlay
                .apply_membership(&joined, &self.scene, &self.tank.registry, &mut self.layer);
        }
    }

    pub fn run() -> Result<(), SetupError> {
        run_tank()?;
        run_sorting();
        Ok(())
    }

    fn run_tank() -> Result<(), SetupError> {
        let mut scene = HeadlessScene::new(800.0, 600.0);
        for (src, left) in [
            ("fish_goldfish.png", false),
            ("fish_clown.png", true),
            ("fish_seahorse.png", false),
            ("fish_jelly.png", true),
        ] {
            scene.insert(NodeInfo::fish(src, left), Rect::new(0.0, 0.0, 60.0, 40.0));
        }
        scene.insert(NodeInfo::bottom_object("bottom_seaweed.png"), Rect::new(80.0, 480.0, 60.0, 120.0));
        scene.insert(NodeInfo::bottom_object("bottom_seaweed.png"), Rect::new(620.0, 470.0, 60.0, 130.0));
        scene.insert(NodeInfo::bottom_object("bottom_shell.png"), Rect::new(360.0, 560.0, 50.0, 30.0));
        scene.take_changes();

        let tank = Aquarium::new(AquariumConfig::for_platform(PlatformClass::Desktop), &scene, 42)?;
        let mut layer = HeadlessOverlay::new();
        let overlay = OverlayManager::setup(&scene, &tank.registry, &mut layer);

        let session = Rc::new(RefCell::new(Session {
            scene,
            layer,
            tank,
            overlay,
            sim: SimulationLoop::starting_at(0.0),
            watcher: SceneWatcher::new(),
            respawns: 0,
        }));

        let source = Rc::new(ManualTickSource::new());
        let sim_session = session.clone();
        let sim_loop = run_loop(source.clone(), move |now| {
            let s = &mut *sim_session.borrow_mut();
            let report = s.sim.frame(&mut s.tank, &mut s.scene, now);
            s.respawns += report.respawned;
        });
        let overlay_session = session.clone();
        let overlay_loop = run_loop(source.clone(), move |_| {
            let s = &mut *overlay_session.borrow_mut();
            s.overlay.frame(&s.tank.registry, &mut s.layer);
        });

        let frames = SECONDS * HZ as u32;
        let mut late_fish = None;
        for frame in 1..=frames {
            let now = frame as f64 * 1000.0 / HZ;
            if frame == frames / 6 {
                let s = &mut *session.borrow_mut();
                let node = s
                    .scene
                    .insert(NodeInfo::fish("fish_yellow_tang.png", false), Rect::new(0.0, 0.0, 70.0, 50.0));
                s.sync_scene();
                late_fish = Some(node);
            }
            if frame == frames / 2 {
                if let Some(node) = late_fish {
                    let s = &mut *session.borrow_mut();
                    s.scene.remove(node);
                    s.sync_scene();
                }
            }
            if frame == frames / 3 {
                let s = &mut *session.borrow_mut();
                let point = s.overlay.regions().next().map(|r| r.bounds().center());
                if let Some(point) = point {
                    if let ClickOutcome::Handled { bound, active } = s.overlay.click(point, &mut s.layer) {
                        log::info!("Clicked region {:?}, active: {}", bound, active);
                    }
                }
            }
            source.fire(now);
        }

        sim_loop.stop();
        overlay_loop.stop();

        let s = session.borrow();
        log::info!(
            "Ran {} frames: {} fish, {} regions ({} tracking fish), {} respawns, {} transform writes",
            frames,
            s.tank.registry.len(),
            s.overlay.len(),
            s.overlay.animated_count(),
            s.respawns,
            s.scene.transform_writes
        );
        for fish in s.tank.registry.iter() {
            log::info!(
                "  {:?} {:?} at ({:.1}, {:.1}) heading {:?}",
                fish.node,
                fish.kind,
                fish.x,
                fish.smooth_y,
                fish.direction
            );
        }
        Ok(())
    }

    fn run_sorting() {
        let colors = [
            BowlColor::Red,
            BowlColor::Orange,
            BowlColor::Yellow,
            BowlColor::Green,
            BowlColor::Blue,
            BowlColor::Purple,
        ];
        let bowls = colors
            .iter()
            .enumerate()
            .map(|(i, &color)| Bowl {
                color,
                rect: Rect::new(i as f32 * 160.0, 500.0, 140.0, 140.0),
            })
            .collect();
        let mut board = SortingBoard::new(bowls);
        let mut rng = Pcg32::seed_from_u64(7);
        board.spawn_round(Vec2::new(960.0, 400.0), 140.0, false, &mut rng);

        // Drop each fruit on the first bowl, then sort the rest properly
        let mut misses = 0;
        while let Some(piece) = board.fruits().first().cloned() {
            let first = board.bowls()[0].rect;
            board.start_drag(piece.id, piece.home.pos);
            board.drag_to(first.pos);
            match board.end_drag() {
                Some(Placement::Accepted { .. }) => continue,
                _ => misses += 1,
            }

            let Some(target) = board.bowls().iter().position(|b| b.color == piece.fruit.color()) else {
                break;
            };
            board.click_fruit(piece.id);
            board.click_bowl(target);
        }
        log::info!(
            "Sorting: {} rounds complete, {} fruits sent back",
            board.rounds_completed,
            misses
        );
    }
}
